use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::CString;

use log::debug;
use num_bigint::{BigInt, BigUint, Sign};
use num_rational::BigRational;
use num_traits::One;
use z3::{
    ast::{exists_const, forall_const, Array, Ast, Bool, Dynamic, Int, Real, BV},
    Context, FuncDecl, Sort,
};
use z3_sys::*;

use crate::error::FormulaError;
use crate::raw;
use crate::types::{Formula, FormulaType, FunctionDeclaration};

/// Everything that identifies a declared symbol. Constants have no arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub name: String,
    pub arguments: Vec<FormulaType>,
    pub result: FormulaType,
}

impl Signature {
    fn constant(name: &str, ty: &FormulaType) -> Self {
        Signature {
            name: name.to_owned(),
            arguments: Vec::new(),
            result: ty.clone(),
        }
    }
}

enum Declared<'ctx> {
    Constant(Formula<'ctx>),
    Function(FunctionDeclaration<'ctx>),
}

/// Builds formulas for every supported theory.
///
/// Declarations are global: the manager remembers every symbol it hands out,
/// keyed by name and signature, for as long as the manager lives. Prover
/// stacks never see or scope them, so a symbol declared while some stack is
/// three levels deep is still the same symbol after that stack is emptied.
pub struct FormulaManager<'ctx> {
    ctx: &'ctx Context,
    declarations: RefCell<HashMap<Signature, Declared<'ctx>>>,
}

// Numeral operands after promotion: both integer, or both rational.
enum Numerals<'ctx> {
    Int(Int<'ctx>, Int<'ctx>),
    Real(Real<'ctx>, Real<'ctx>),
}

impl<'ctx> FormulaManager<'ctx> {
    pub fn new(ctx: &'ctx Context) -> Self {
        FormulaManager {
            ctx,
            declarations: RefCell::new(HashMap::new()),
        }
    }

    pub fn context(&self) -> &'ctx Context {
        self.ctx
    }

    pub fn formula_type<'f>(&self, formula: &'f Formula<'ctx>) -> &'f FormulaType {
        formula.formula_type()
    }

    /// Number of distinct symbols declared through this manager.
    pub fn declaration_count(&self) -> usize {
        self.declarations.borrow().len()
    }

    pub fn is_declared(&self, signature: &Signature) -> bool {
        self.declarations.borrow().contains_key(signature)
    }

    /****************************
    *
    *   Declarations
    *
    ****************************/

    /// Returns the constant `name` of type `ty`, declaring it on first use.
    /// Fails with `ZeroWidth` for a bitvector of width zero anywhere in `ty`.
    pub fn make_variable(&self, name: &str, ty: FormulaType) -> Result<Formula<'ctx>, FormulaError> {
        ty.validate()?;
        Ok(self.declare_constant(name, ty))
    }

    // Infallible shorthands for the scalar sorts.
    pub fn make_boolean_variable(&self, name: &str) -> Formula<'ctx> {
        self.declare_constant(name, FormulaType::Boolean)
    }

    pub fn make_integer_variable(&self, name: &str) -> Formula<'ctx> {
        self.declare_constant(name, FormulaType::Integer)
    }

    pub fn make_rational_variable(&self, name: &str) -> Formula<'ctx> {
        self.declare_constant(name, FormulaType::Rational)
    }

    fn declare_constant(&self, name: &str, ty: FormulaType) -> Formula<'ctx> {
        let signature = Signature::constant(name, &ty);
        if let Some(Declared::Constant(known)) = self.declarations.borrow().get(&signature) {
            return known.clone();
        }

        let ast = match &ty {
            FormulaType::Boolean => Dynamic::from_ast(&Bool::new_const(self.ctx, name)),
            FormulaType::Integer => Dynamic::from_ast(&Int::new_const(self.ctx, name)),
            FormulaType::Rational => Dynamic::from_ast(&Real::new_const(self.ctx, name)),
            FormulaType::Bitvector(width) => {
                Dynamic::from_ast(&BV::new_const(self.ctx, name, *width))
            }
            FormulaType::Array(index, element) => Dynamic::from_ast(&Array::new_const(
                self.ctx,
                name,
                &index.to_sort(self.ctx),
                &element.to_sort(self.ctx),
            )),
        };
        debug!("declared constant {} : {}", name, ty);
        let formula = Formula::new(ast, ty);
        self.declarations
            .borrow_mut()
            .insert(signature, Declared::Constant(formula.clone()));
        formula
    }

    pub fn declare_uf(
        &self,
        name: &str,
        result: FormulaType,
        arguments: Vec<FormulaType>,
    ) -> Result<FunctionDeclaration<'ctx>, FormulaError> {
        result.validate()?;
        for argument in &arguments {
            argument.validate()?;
        }
        let signature = Signature {
            name: name.to_owned(),
            arguments: arguments.clone(),
            result: result.clone(),
        };
        if let Some(Declared::Function(known)) = self.declarations.borrow().get(&signature) {
            return Ok(known.clone());
        }

        let domain: Vec<Sort<'ctx>> = arguments.iter().map(|ty| ty.to_sort(self.ctx)).collect();
        let domain_refs: Vec<&Sort<'ctx>> = domain.iter().collect();
        let decl = FuncDecl::new(self.ctx, name, &domain_refs, &result.to_sort(self.ctx));
        let declaration = FunctionDeclaration::new(decl, name, arguments, result);
        debug!("declared function {:?}", declaration);
        self.declarations
            .borrow_mut()
            .insert(signature, Declared::Function(declaration.clone()));
        Ok(declaration)
    }

    pub fn call_uf(
        &self,
        function: &FunctionDeclaration<'ctx>,
        args: &[Formula<'ctx>],
    ) -> Result<Formula<'ctx>, FormulaError> {
        if args.len() != function.arity() {
            return Err(FormulaError::Arity {
                name: function.name().to_owned(),
                expected: function.arity(),
                found: args.len(),
            });
        }
        for (arg, expected) in args.iter().zip(function.arguments()) {
            if arg.formula_type() != expected {
                return Err(FormulaError::mismatch(expected.to_string(), arg.formula_type()));
            }
        }
        let refs: Vec<&dyn Ast<'ctx>> = args.iter().map(|a| a.as_dynamic() as &dyn Ast<'ctx>).collect();
        let app = function.decl().apply(&refs);
        Ok(Formula::new(app, function.result().clone()))
    }

    /****************************
    *
    *   Boolean theory
    *
    ****************************/

    pub fn make_boolean(&self, value: bool) -> Formula<'ctx> {
        Formula::new(
            Dynamic::from_ast(&Bool::from_bool(self.ctx, value)),
            FormulaType::Boolean,
        )
    }

    pub fn not(&self, formula: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        Ok(boolean(formula.as_bool()?.not()))
    }

    pub fn and(&self, operands: &[Formula<'ctx>]) -> Result<Formula<'ctx>, FormulaError> {
        if operands.is_empty() {
            return Ok(self.make_boolean(true));
        }
        let bools = operands
            .iter()
            .map(Formula::as_bool)
            .collect::<Result<Vec<_>, _>>()?;
        let refs: Vec<&Bool> = bools.iter().collect();
        Ok(boolean(Bool::and(self.ctx, &refs)))
    }

    pub fn or(&self, operands: &[Formula<'ctx>]) -> Result<Formula<'ctx>, FormulaError> {
        if operands.is_empty() {
            return Ok(self.make_boolean(false));
        }
        let bools = operands
            .iter()
            .map(Formula::as_bool)
            .collect::<Result<Vec<_>, _>>()?;
        let refs: Vec<&Bool> = bools.iter().collect();
        Ok(boolean(Bool::or(self.ctx, &refs)))
    }

    pub fn xor(&self, a: &Formula<'ctx>, b: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        Ok(boolean(a.as_bool()?.xor(&b.as_bool()?)))
    }

    pub fn implies(&self, a: &Formula<'ctx>, b: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        Ok(boolean(a.as_bool()?.implies(&b.as_bool()?)))
    }

    pub fn equivalence(&self, a: &Formula<'ctx>, b: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        Ok(boolean(a.as_bool()?.iff(&b.as_bool()?)))
    }

    pub fn ite(
        &self,
        condition: &Formula<'ctx>,
        then: &Formula<'ctx>,
        otherwise: &Formula<'ctx>,
    ) -> Result<Formula<'ctx>, FormulaError> {
        if then.formula_type() != otherwise.formula_type() {
            return Err(FormulaError::mismatch(
                then.formula_type().to_string(),
                otherwise.formula_type(),
            ));
        }
        let result = condition
            .as_bool()?
            .ite(then.as_dynamic(), otherwise.as_dynamic());
        Ok(Formula::new(result, then.formula_type().clone()))
    }

    /// Equality over any theory. Mixed integer/rational operands are promoted.
    pub fn equal(&self, a: &Formula<'ctx>, b: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        if a.formula_type().is_numeral() && b.formula_type().is_numeral() {
            return Ok(boolean(match self.numerals(a, b)? {
                Numerals::Int(x, y) => x._eq(&y),
                Numerals::Real(x, y) => x._eq(&y),
            }));
        }
        if a.formula_type() != b.formula_type() {
            return Err(FormulaError::mismatch(a.formula_type().to_string(), b.formula_type()));
        }
        Ok(boolean(a.as_dynamic()._eq(b.as_dynamic())))
    }

    /****************************
    *
    *   Integer and rational theory
    *
    ****************************/

    pub fn make_int(&self, value: i64) -> Formula<'ctx> {
        Formula::new(
            Dynamic::from_ast(&Int::from_i64(self.ctx, value)),
            FormulaType::Integer,
        )
    }

    pub fn make_integer(&self, value: &BigInt) -> Result<Formula<'ctx>, FormulaError> {
        self.numeral(&value.to_string(), FormulaType::Integer)
    }

    pub fn make_rational(&self, value: &BigRational) -> Result<Formula<'ctx>, FormulaError> {
        self.numeral(&value.to_string(), FormulaType::Rational)
    }

    pub fn add(&self, a: &Formula<'ctx>, b: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        Ok(match self.numerals(a, b)? {
            Numerals::Int(x, y) => integer(Int::add(self.ctx, &[&x, &y])),
            Numerals::Real(x, y) => rational(Real::add(self.ctx, &[&x, &y])),
        })
    }

    pub fn subtract(&self, a: &Formula<'ctx>, b: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        Ok(match self.numerals(a, b)? {
            Numerals::Int(x, y) => integer(Int::sub(self.ctx, &[&x, &y])),
            Numerals::Real(x, y) => rational(Real::sub(self.ctx, &[&x, &y])),
        })
    }

    /// Non-linear products are passed through; the engine decides.
    pub fn multiply(&self, a: &Formula<'ctx>, b: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        Ok(match self.numerals(a, b)? {
            Numerals::Int(x, y) => integer(Int::mul(self.ctx, &[&x, &y])),
            Numerals::Real(x, y) => rational(Real::mul(self.ctx, &[&x, &y])),
        })
    }

    /// Integer division rounds towards negative infinity for positive
    /// divisors (SMT-LIB `div`); rational division is exact.
    pub fn divide(&self, a: &Formula<'ctx>, b: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        Ok(match self.numerals(a, b)? {
            Numerals::Int(x, y) => integer(x.div(&y)),
            Numerals::Real(x, y) => rational(x.div(&y)),
        })
    }

    pub fn modulo(&self, a: &Formula<'ctx>, b: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        Ok(integer(a.as_int()?.modulo(&b.as_int()?)))
    }

    pub fn negate(&self, a: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        match a.formula_type() {
            FormulaType::Integer => Ok(integer(a.as_int()?.unary_minus())),
            FormulaType::Rational => Ok(rational(a.as_real()?.unary_minus())),
            other => Err(FormulaError::mismatch("Integer or Rational", other)),
        }
    }

    /// `a ≡ b (mod modulus)`. A non-positive modulus constrains nothing.
    pub fn modular_congruence(
        &self,
        a: &Formula<'ctx>,
        b: &Formula<'ctx>,
        modulus: &BigInt,
    ) -> Result<Formula<'ctx>, FormulaError> {
        if modulus.sign() != Sign::Plus {
            return Ok(self.make_boolean(true));
        }
        let difference = self.subtract(a, b)?;
        let remainder = self.modulo(&difference, &self.make_integer(modulus)?)?;
        self.equal(&remainder, &self.make_int(0))
    }

    pub fn less_than(&self, a: &Formula<'ctx>, b: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        Ok(boolean(match self.numerals(a, b)? {
            Numerals::Int(x, y) => x.lt(&y),
            Numerals::Real(x, y) => x.lt(&y),
        }))
    }

    pub fn less_or_equals(&self, a: &Formula<'ctx>, b: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        Ok(boolean(match self.numerals(a, b)? {
            Numerals::Int(x, y) => x.le(&y),
            Numerals::Real(x, y) => x.le(&y),
        }))
    }

    pub fn greater_than(&self, a: &Formula<'ctx>, b: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        Ok(boolean(match self.numerals(a, b)? {
            Numerals::Int(x, y) => x.gt(&y),
            Numerals::Real(x, y) => x.gt(&y),
        }))
    }

    pub fn greater_or_equals(&self, a: &Formula<'ctx>, b: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        Ok(boolean(match self.numerals(a, b)? {
            Numerals::Int(x, y) => x.ge(&y),
            Numerals::Real(x, y) => x.ge(&y),
        }))
    }

    fn numerals(&self, a: &Formula<'ctx>, b: &Formula<'ctx>) -> Result<Numerals<'ctx>, FormulaError> {
        match (a.formula_type(), b.formula_type()) {
            (FormulaType::Integer, FormulaType::Integer) => Ok(Numerals::Int(a.as_int()?, b.as_int()?)),
            (x, y) if x.is_numeral() && y.is_numeral() => Ok(Numerals::Real(a.as_real()?, b.as_real()?)),
            (x, y) if x.is_numeral() => Err(FormulaError::mismatch("Integer or Rational", y)),
            (x, _) => Err(FormulaError::mismatch("Integer or Rational", x)),
        }
    }

    /****************************
    *
    *   Bitvector theory
    *
    ****************************/

    /// Values outside `0..2^width` wrap around, negative values included.
    pub fn make_bitvector(&self, width: u32, value: &BigInt) -> Result<Formula<'ctx>, FormulaError> {
        FormulaType::Bitvector(width).validate()?;
        let modulus = BigInt::one() << width;
        let wrapped = ((value % &modulus) + &modulus) % &modulus;
        self.numeral(&wrapped.to_string(), FormulaType::Bitvector(width))
    }

    pub fn make_bitvector_unsigned(&self, width: u32, value: &BigUint) -> Result<Formula<'ctx>, FormulaError> {
        self.make_bitvector(width, &BigInt::from(value.clone()))
    }

    // Decimal text, optionally signed, `n/d` for rationals.
    fn numeral(&self, text: &str, ty: FormulaType) -> Result<Formula<'ctx>, FormulaError> {
        let invalid = || FormulaError::InvalidLiteral {
            ty: ty.clone(),
            literal: text.to_owned(),
        };
        let c_text = CString::new(text).map_err(|_| invalid())?;
        let ctx = raw::raw_context(self.ctx);
        unsafe {
            let sort = match &ty {
                FormulaType::Integer => Z3_mk_int_sort(ctx),
                FormulaType::Rational => Z3_mk_real_sort(ctx),
                FormulaType::Bitvector(width) => Z3_mk_bv_sort(ctx, *width),
                _ => return Err(invalid()),
            };
            let ast = Z3_mk_numeral(ctx, c_text.as_ptr(), sort);
            if ast.is_null() || Z3_get_error_code(ctx) != ErrorCode::OK {
                return Err(invalid());
            }
            Formula::wrap(self.ctx, ast)
        }
    }

    pub fn bv_add(&self, a: &Formula<'ctx>, b: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        self.bv_binary(a, b, |x, y| x.bvadd(y))
    }

    pub fn bv_subtract(&self, a: &Formula<'ctx>, b: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        self.bv_binary(a, b, |x, y| x.bvsub(y))
    }

    pub fn bv_multiply(&self, a: &Formula<'ctx>, b: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        self.bv_binary(a, b, |x, y| x.bvmul(y))
    }

    pub fn bv_divide(&self, a: &Formula<'ctx>, b: &Formula<'ctx>, signed: bool) -> Result<Formula<'ctx>, FormulaError> {
        if signed {
            self.bv_binary(a, b, |x, y| x.bvsdiv(y))
        } else {
            self.bv_binary(a, b, |x, y| x.bvudiv(y))
        }
    }

    /// Remainder; the signed variant takes the sign of the dividend.
    pub fn bv_modulo(&self, a: &Formula<'ctx>, b: &Formula<'ctx>, signed: bool) -> Result<Formula<'ctx>, FormulaError> {
        if signed {
            self.bv_binary(a, b, |x, y| x.bvsrem(y))
        } else {
            self.bv_binary(a, b, |x, y| x.bvurem(y))
        }
    }

    pub fn bv_and(&self, a: &Formula<'ctx>, b: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        self.bv_binary(a, b, |x, y| x.bvand(y))
    }

    pub fn bv_or(&self, a: &Formula<'ctx>, b: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        self.bv_binary(a, b, |x, y| x.bvor(y))
    }

    pub fn bv_xor(&self, a: &Formula<'ctx>, b: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        self.bv_binary(a, b, |x, y| x.bvxor(y))
    }

    pub fn bv_shift_left(&self, a: &Formula<'ctx>, by: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        self.bv_binary(a, by, |x, y| x.bvshl(y))
    }

    pub fn bv_shift_right(&self, a: &Formula<'ctx>, by: &Formula<'ctx>, signed: bool) -> Result<Formula<'ctx>, FormulaError> {
        if signed {
            self.bv_binary(a, by, |x, y| x.bvashr(y))
        } else {
            self.bv_binary(a, by, |x, y| x.bvlshr(y))
        }
    }

    pub fn bv_not(&self, a: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        let width = bv_width(a)?;
        Ok(bitvector(a.as_bv()?.bvnot(), width))
    }

    pub fn bv_negate(&self, a: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        let width = bv_width(a)?;
        Ok(bitvector(a.as_bv()?.bvneg(), width))
    }

    pub fn bv_less_than(&self, a: &Formula<'ctx>, b: &Formula<'ctx>, signed: bool) -> Result<Formula<'ctx>, FormulaError> {
        self.bv_compare(a, b, |x, y| if signed { x.bvslt(y) } else { x.bvult(y) })
    }

    pub fn bv_less_or_equals(&self, a: &Formula<'ctx>, b: &Formula<'ctx>, signed: bool) -> Result<Formula<'ctx>, FormulaError> {
        self.bv_compare(a, b, |x, y| if signed { x.bvsle(y) } else { x.bvule(y) })
    }

    pub fn bv_greater_than(&self, a: &Formula<'ctx>, b: &Formula<'ctx>, signed: bool) -> Result<Formula<'ctx>, FormulaError> {
        self.bv_compare(a, b, |x, y| if signed { x.bvsgt(y) } else { x.bvugt(y) })
    }

    pub fn bv_greater_or_equals(&self, a: &Formula<'ctx>, b: &Formula<'ctx>, signed: bool) -> Result<Formula<'ctx>, FormulaError> {
        self.bv_compare(a, b, |x, y| if signed { x.bvsge(y) } else { x.bvuge(y) })
    }

    /// Bits `high` down to `low`, both inclusive.
    pub fn bv_extract(&self, a: &Formula<'ctx>, high: u32, low: u32) -> Result<Formula<'ctx>, FormulaError> {
        let width = bv_width(a)?;
        if high < low || high >= width {
            return Err(FormulaError::mismatch(
                format!("extract [{}:{}] within Bitvector<{}>", high, low, width),
                a.formula_type(),
            ));
        }
        Ok(bitvector(a.as_bv()?.extract(high, low), high - low + 1))
    }

    pub fn bv_concat(&self, a: &Formula<'ctx>, b: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        let width = bv_width(a)? + bv_width(b)?;
        Ok(bitvector(a.as_bv()?.concat(&b.as_bv()?), width))
    }

    pub fn bv_extend(&self, a: &Formula<'ctx>, extra: u32, signed: bool) -> Result<Formula<'ctx>, FormulaError> {
        let width = bv_width(a)? + extra;
        let bv = a.as_bv()?;
        let extended = if signed { bv.sign_ext(extra) } else { bv.zero_ext(extra) };
        Ok(bitvector(extended, width))
    }

    fn bv_binary(
        &self,
        a: &Formula<'ctx>,
        b: &Formula<'ctx>,
        op: impl FnOnce(&BV<'ctx>, &BV<'ctx>) -> BV<'ctx>,
    ) -> Result<Formula<'ctx>, FormulaError> {
        let width = same_width(a, b)?;
        Ok(bitvector(op(&a.as_bv()?, &b.as_bv()?), width))
    }

    fn bv_compare(
        &self,
        a: &Formula<'ctx>,
        b: &Formula<'ctx>,
        op: impl FnOnce(&BV<'ctx>, &BV<'ctx>) -> Bool<'ctx>,
    ) -> Result<Formula<'ctx>, FormulaError> {
        same_width(a, b)?;
        Ok(boolean(op(&a.as_bv()?, &b.as_bv()?)))
    }

    /****************************
    *
    *   Array theory
    *
    ****************************/

    pub fn select(&self, array: &Formula<'ctx>, index: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        let (index_ty, element_ty) = array_parts(array)?;
        if index.formula_type() != index_ty {
            return Err(FormulaError::mismatch(index_ty.to_string(), index.formula_type()));
        }
        let element = array.as_array()?.select(index.as_dynamic());
        Ok(Formula::new(element, element_ty.clone()))
    }

    pub fn store(
        &self,
        array: &Formula<'ctx>,
        index: &Formula<'ctx>,
        value: &Formula<'ctx>,
    ) -> Result<Formula<'ctx>, FormulaError> {
        let (index_ty, element_ty) = array_parts(array)?;
        if index.formula_type() != index_ty {
            return Err(FormulaError::mismatch(index_ty.to_string(), index.formula_type()));
        }
        if value.formula_type() != element_ty {
            return Err(FormulaError::mismatch(element_ty.to_string(), value.formula_type()));
        }
        let stored = array
            .as_array()?
            .store(index.as_dynamic(), value.as_dynamic());
        Ok(Formula::new(Dynamic::from_ast(&stored), array.formula_type().clone()))
    }

    /****************************
    *
    *   Quantifiers
    *
    ****************************/

    pub fn forall(&self, bound: &[Formula<'ctx>], body: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        let refs = self.bound_variables(bound)?;
        Ok(boolean(forall_const(self.ctx, &refs, &[], &body.as_bool()?)))
    }

    pub fn exists(&self, bound: &[Formula<'ctx>], body: &Formula<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        let refs = self.bound_variables(bound)?;
        Ok(boolean(exists_const(self.ctx, &refs, &[], &body.as_bool()?)))
    }

    // Only uninterpreted constants can be bound.
    fn bound_variables<'f>(&self, bound: &'f [Formula<'ctx>]) -> Result<Vec<&'f dyn Ast<'ctx>>, FormulaError> {
        let ctx = raw::raw_context(self.ctx);
        for var in bound {
            let is_constant = unsafe {
                matches!(raw::app_decl_kind(ctx, var.native()), Some(DeclKind::UNINTERPRETED))
                    && Z3_get_app_num_args(ctx, Z3_to_app(ctx, var.native())) == 0
            };
            if !is_constant {
                return Err(FormulaError::NotAVariable(var.to_string()));
            }
        }
        Ok(bound.iter().map(|v| v.as_dynamic() as &dyn Ast<'ctx>).collect())
    }
}

fn boolean(ast: Bool<'_>) -> Formula<'_> {
    Formula::new(Dynamic::from_ast(&ast), FormulaType::Boolean)
}

fn integer(ast: Int<'_>) -> Formula<'_> {
    Formula::new(Dynamic::from_ast(&ast), FormulaType::Integer)
}

fn rational(ast: Real<'_>) -> Formula<'_> {
    Formula::new(Dynamic::from_ast(&ast), FormulaType::Rational)
}

fn bitvector(ast: BV<'_>, width: u32) -> Formula<'_> {
    Formula::new(Dynamic::from_ast(&ast), FormulaType::Bitvector(width))
}

fn bv_width(formula: &Formula<'_>) -> Result<u32, FormulaError> {
    match formula.formula_type() {
        FormulaType::Bitvector(width) => Ok(*width),
        other => Err(FormulaError::mismatch("Bitvector", other)),
    }
}

fn same_width(a: &Formula<'_>, b: &Formula<'_>) -> Result<u32, FormulaError> {
    let width = bv_width(a)?;
    if bv_width(b)? != width {
        return Err(FormulaError::mismatch(
            FormulaType::Bitvector(width).to_string(),
            b.formula_type(),
        ));
    }
    Ok(width)
}

fn array_parts<'f>(array: &'f Formula<'_>) -> Result<(&'f FormulaType, &'f FormulaType), FormulaError> {
    match array.formula_type() {
        FormulaType::Array(index, element) => Ok((index, element)),
        other => Err(FormulaError::mismatch("Array", other)),
    }
}
