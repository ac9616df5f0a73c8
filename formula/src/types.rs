use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use z3::{
    ast::{Ast, Array, Bool, Dynamic, Int, Real, BV},
    Context, FuncDecl, Sort,
};
use z3_sys::*;

use crate::error::FormulaError;
use crate::raw;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormulaType {
    Boolean,
    Integer,
    Rational,
    Bitvector(u32),
    Array(Box<FormulaType>, Box<FormulaType>),
}

impl FormulaType {
    pub fn array(index: FormulaType, element: FormulaType) -> Self {
        FormulaType::Array(Box::new(index), Box::new(element))
    }

    pub fn is_numeral(&self) -> bool {
        matches!(self, FormulaType::Integer | FormulaType::Rational)
    }

    /// Rejects bitvectors of width zero, also inside arrays.
    pub fn validate(&self) -> Result<(), FormulaError> {
        match self {
            FormulaType::Bitvector(0) => Err(FormulaError::ZeroWidth),
            FormulaType::Array(index, element) => {
                index.validate()?;
                element.validate()
            }
            _ => Ok(()),
        }
    }

    /// How many `select`s it takes to reach a non-array element.
    pub fn array_depth(&self) -> usize {
        match self {
            FormulaType::Array(_, element) => 1 + element.array_depth(),
            _ => 0,
        }
    }

    pub fn to_sort<'ctx>(&self, ctx: &'ctx Context) -> Sort<'ctx> {
        match self {
            FormulaType::Boolean => Sort::bool(ctx),
            FormulaType::Integer => Sort::int(ctx),
            FormulaType::Rational => Sort::real(ctx),
            FormulaType::Bitvector(width) => Sort::bitvector(ctx, *width),
            FormulaType::Array(index, element) => {
                Sort::array(ctx, &index.to_sort(ctx), &element.to_sort(ctx))
            }
        }
    }

    /// Reads the type of a native sort. Sorts outside the supported theories
    /// are reported, never approximated.
    ///
    /// # Safety
    ///
    /// `sort` must be a live sort of `ctx`.
    pub unsafe fn from_native(ctx: Z3_context, sort: Z3_sort) -> Result<Self, FormulaError> {
        match Z3_get_sort_kind(ctx, sort) {
            SortKind::Bool => Ok(FormulaType::Boolean),
            SortKind::Int => Ok(FormulaType::Integer),
            SortKind::Real => Ok(FormulaType::Rational),
            SortKind::BV => Ok(FormulaType::Bitvector(Z3_get_bv_sort_size(ctx, sort))),
            SortKind::Array => {
                let index = Self::from_native(ctx, Z3_get_array_sort_domain(ctx, sort))?;
                let element = Self::from_native(ctx, Z3_get_array_sort_range(ctx, sort))?;
                Ok(FormulaType::array(index, element))
            }
            _ => Err(FormulaError::UnsupportedSort(raw::sort_to_string(ctx, sort))),
        }
    }
}

impl fmt::Display for FormulaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaType::Boolean => write!(f, "Boolean"),
            FormulaType::Integer => write!(f, "Integer"),
            FormulaType::Rational => write!(f, "Rational"),
            FormulaType::Bitvector(width) => write!(f, "Bitvector<{}>", width),
            FormulaType::Array(index, element) => write!(f, "Array<{}, {}>", index, element),
        }
    }
}

/// A term of the engine together with its theory type.
///
/// Cloning takes another native reference on the term. Equality and hashing
/// are structural: two formulas built from the same declaration and arguments
/// compare equal no matter when or where they were built.
#[derive(Clone)]
pub struct Formula<'ctx> {
    ast: Dynamic<'ctx>,
    ty: FormulaType,
}

impl<'ctx> Formula<'ctx> {
    pub(crate) fn new(ast: Dynamic<'ctx>, ty: FormulaType) -> Self {
        Formula { ast, ty }
    }

    /// Reads the type off the term's sort.
    pub fn from_dynamic(ast: Dynamic<'ctx>) -> Result<Self, FormulaError> {
        let ctx = raw::raw_context(ast.get_ctx());
        let ty = unsafe { FormulaType::from_native(ctx, Z3_get_sort(ctx, ast.get_z3_ast())) }?;
        Ok(Formula { ast, ty })
    }

    /// Takes a counted reference on a native term.
    ///
    /// # Safety
    ///
    /// `ast` must be a live, non-null term of `ctx`.
    pub unsafe fn wrap(ctx: &'ctx Context, ast: Z3_ast) -> Result<Self, FormulaError> {
        Self::from_dynamic(Dynamic::wrap(ctx, ast))
    }

    pub fn formula_type(&self) -> &FormulaType {
        &self.ty
    }

    pub fn context(&self) -> &'ctx Context {
        self.ast.get_ctx()
    }

    pub fn as_dynamic(&self) -> &Dynamic<'ctx> {
        &self.ast
    }

    /// The native term. The handle is only valid while `self` is alive.
    pub fn native(&self) -> Z3_ast {
        self.ast.get_z3_ast()
    }

    pub fn as_bool(&self) -> Result<Bool<'ctx>, FormulaError> {
        self.ast
            .as_bool()
            .ok_or_else(|| FormulaError::mismatch("Boolean", &self.ty))
    }

    pub fn as_int(&self) -> Result<Int<'ctx>, FormulaError> {
        self.ast
            .as_int()
            .ok_or_else(|| FormulaError::mismatch("Integer", &self.ty))
    }

    /// Integers are promoted, so any numeral formula can be read as rational.
    pub fn as_real(&self) -> Result<Real<'ctx>, FormulaError> {
        match self.ty {
            FormulaType::Integer => Ok(Real::from_int(&self.as_int()?)),
            _ => self
                .ast
                .as_real()
                .ok_or_else(|| FormulaError::mismatch("Rational", &self.ty)),
        }
    }

    pub fn as_bv(&self) -> Result<BV<'ctx>, FormulaError> {
        self.ast
            .as_bv()
            .ok_or_else(|| FormulaError::mismatch("Bitvector", &self.ty))
    }

    pub fn as_array(&self) -> Result<Array<'ctx>, FormulaError> {
        self.ast
            .as_array()
            .ok_or_else(|| FormulaError::mismatch("Array", &self.ty))
    }

    fn raw_context(&self) -> Z3_context {
        raw::raw_context(self.ast.get_ctx())
    }
}

impl<'ctx> PartialEq for Formula<'ctx> {
    fn eq(&self, other: &Self) -> bool {
        unsafe { Z3_is_eq_ast(self.raw_context(), self.native(), other.native()) }
    }
}

impl<'ctx> Eq for Formula<'ctx> {}

impl<'ctx> Hash for Formula<'ctx> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        unsafe { Z3_get_ast_hash(self.raw_context(), self.native()) }.hash(state);
    }
}

impl<'ctx> fmt::Display for Formula<'ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ast)
    }
}

impl<'ctx> fmt::Debug for Formula<'ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Formula({} : {})", self.ast, self.ty)
    }
}

/// An uninterpreted function symbol.
#[derive(Clone)]
pub struct FunctionDeclaration<'ctx> {
    decl: Rc<FuncDecl<'ctx>>,
    name: String,
    arguments: Vec<FormulaType>,
    result: FormulaType,
}

impl<'ctx> FunctionDeclaration<'ctx> {
    pub(crate) fn new(
        decl: FuncDecl<'ctx>,
        name: &str,
        arguments: Vec<FormulaType>,
        result: FormulaType,
    ) -> Self {
        FunctionDeclaration {
            decl: Rc::new(decl),
            name: name.to_owned(),
            arguments,
            result,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[FormulaType] {
        &self.arguments
    }

    pub fn result(&self) -> &FormulaType {
        &self.result
    }

    pub fn arity(&self) -> usize {
        self.arguments.len()
    }

    pub(crate) fn decl(&self) -> &FuncDecl<'ctx> {
        &self.decl
    }
}

impl<'ctx> fmt::Debug for FunctionDeclaration<'ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (idx, arg) in self.arguments.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ") -> {}", self.result)
    }
}
