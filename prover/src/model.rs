//! Reading engine models into [`ValueAssignment`]s.
//!
//! The engine keeps arrays as functions from index to element, renames
//! functions to internal aliases, and adds auxiliary symbols of its own. The
//! [`Model`] hides all of that: callers see one record per constant, per
//! function entry and per (possibly nested) array cell, named after the
//! symbol the client declared.

use std::cell::{OnceCell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::ptr;

use formula::{raw, Formula, FormulaError, FormulaType};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use log::{debug, trace, warn};
use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use regex::Regex;
use z3::Context;
use z3_sys::*;

use crate::assignment::ValueAssignment;
use crate::codec;
use crate::error::{Result, SolverError};
use crate::native::{check_error, Native};
use crate::value::Value;

lazy_static! {
    // Skolem constants and aliases the engine introduces end in `!<digits>`.
    // A client may use the same shape, so this is only a heuristic.
    static ref INTERNAL_SYMBOL: Regex = Regex::new(r"^.*![0-9]+$").expect("valid regex");
}

pub fn is_internal_symbol(name: &str) -> bool {
    INTERNAL_SYMBOL.is_match(name)
}

/// A satisfying assignment, valid for as long as it is alive.
pub struct Model<'ctx> {
    ctx: &'ctx Context,
    model: Native<'ctx, Z3_model>,
    hidden: HashSet<String>,
    evaluations: RefCell<HashMap<Formula<'ctx>, Option<Value>>>,
    extraction: OnceCell<Extraction<'ctx>>,
}

#[derive(Default)]
struct Extraction<'ctx> {
    records: Vec<ValueAssignment<'ctx>>,
    by_name: IndexMap<String, Vec<usize>>,
    faults: Vec<SolverError>,
}

impl<'ctx> Extraction<'ctx> {
    // All records of one declaration, or none of them.
    fn commit(&mut self, declaration: &str, result: Result<Vec<ValueAssignment<'ctx>>>) {
        match result {
            Ok(records) => {
                for record in records {
                    self.by_name
                        .entry(record.name().to_owned())
                        .or_default()
                        .push(self.records.len());
                    self.records.push(record);
                }
            }
            Err(fault) => {
                warn!("no assignments for {}: {}", declaration, fault);
                self.faults.push(fault);
            }
        }
    }
}

struct ArrayFrame<'ctx> {
    term: Formula<'ctx>,
    value: Native<'ctx, Z3_ast>,
    indices: Vec<Value>,
    depth: usize,
}

type Entry<'ctx> = (Native<'ctx, Z3_ast>, Native<'ctx, Z3_ast>);

impl<'ctx> Model<'ctx> {
    /// `hidden` names constants that exist for the session's own bookkeeping
    /// and are never reported.
    pub(crate) fn new(ctx: &'ctx Context, model: Native<'ctx, Z3_model>, hidden: HashSet<String>) -> Self {
        Model {
            ctx,
            model,
            hidden,
            evaluations: RefCell::new(HashMap::new()),
            extraction: OnceCell::new(),
        }
    }

    /// Value of `formula` in this model, without completing the model.
    ///
    /// `Ok(None)` means the engine left the formula unreduced, which is taken
    /// to mean its value does not matter. Results are cached, so asking twice
    /// gives the same answer.
    pub fn evaluate(&self, formula: &Formula<'ctx>) -> Result<Option<Value>> {
        if let Some(known) = self.evaluations.borrow().get(formula) {
            return Ok(known.clone());
        }
        let value = unsafe { self.evaluate_native(formula.native()) }?;
        self.evaluations
            .borrow_mut()
            .insert(formula.clone(), value.clone());
        Ok(value)
    }

    pub fn evaluate_bool(&self, formula: &Formula<'ctx>) -> Result<Option<bool>> {
        self.evaluate_typed(formula, "Boolean", |ty| ty == &FormulaType::Boolean, Value::as_bool)
    }

    pub fn evaluate_int(&self, formula: &Formula<'ctx>) -> Result<Option<BigInt>> {
        self.evaluate_typed(formula, "Integer", |ty| ty == &FormulaType::Integer, |v| {
            v.as_int().cloned()
        })
    }

    pub fn evaluate_rational(&self, formula: &Formula<'ctx>) -> Result<Option<BigRational>> {
        self.evaluate_typed(formula, "Integer or Rational", FormulaType::is_numeral, Value::as_rational)
    }

    pub fn evaluate_bitvector(&self, formula: &Formula<'ctx>) -> Result<Option<BigUint>> {
        self.evaluate_typed(
            formula,
            "Bitvector",
            |ty| matches!(ty, FormulaType::Bitvector(_)),
            |v| v.as_bitvector().map(|(value, _)| value.clone()),
        )
    }

    fn evaluate_typed<T>(
        &self,
        formula: &Formula<'ctx>,
        expected: &str,
        accepts: impl Fn(&FormulaType) -> bool,
        read: impl Fn(&Value) -> Option<T>,
    ) -> Result<Option<T>> {
        if !accepts(formula.formula_type()) {
            return Err(FormulaError::TypeMismatch {
                expected: expected.to_owned(),
                found: formula.formula_type().clone(),
            }
            .into());
        }
        match self.evaluate(formula)? {
            None => Ok(None),
            Some(value) => read(&value).map(Some).ok_or_else(|| {
                SolverError::unexpected(format!("{} evaluated to {}, not a {} literal", formula, value, expected))
            }),
        }
    }

    /// Every record of the model, computed on first use.
    ///
    /// Declarations the extractor could not make sense of are left out; see
    /// [`Model::faults`].
    pub fn assignments(&self) -> &[ValueAssignment<'ctx>] {
        &self.extraction().records
    }

    /// Like [`Model::assignments`], but fails with the first fault.
    pub fn try_assignments(&self) -> Result<&[ValueAssignment<'ctx>]> {
        let extraction = self.extraction();
        match extraction.faults.first() {
            Some(fault) => Err(fault.clone()),
            None => Ok(&extraction.records),
        }
    }

    pub fn faults(&self) -> &[SolverError] {
        &self.extraction().faults
    }

    pub fn assignments_named(&self, name: &str) -> Vec<&ValueAssignment<'ctx>> {
        let extraction = self.extraction();
        extraction
            .by_name
            .get(name)
            .map(|indices| indices.iter().map(|&idx| &extraction.records[idx]).collect())
            .unwrap_or_default()
    }

    /// Names with at least one record, in extraction order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.extraction().by_name.keys().map(String::as_str)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValueAssignment<'ctx>> {
        self.assignments().iter()
    }

    fn extraction(&self) -> &Extraction<'ctx> {
        self.extraction.get_or_init(|| self.extract())
    }

    fn raw_context(&self) -> Z3_context {
        self.model.raw_context()
    }

    /****************************
    *
    *   Extraction
    *
    ****************************/

    fn extract(&self) -> Extraction<'ctx> {
        let ctx = self.raw_context();
        let model = self.model.get();
        let mut extraction = Extraction::default();

        let num_consts = unsafe { Z3_model_get_num_consts(ctx, model) };
        for idx in 0..num_consts {
            let decl = match unsafe { Native::acquire(self.ctx, Z3_model_get_const_decl(ctx, model, idx)) } {
                Ok(decl) => decl,
                Err(fault) => {
                    extraction.commit(&format!("constant #{}", idx), Err(fault));
                    continue;
                }
            };
            let name = unsafe { raw::decl_name(ctx, decl.get()) };
            if self.hidden.contains(&name) {
                continue;
            }
            let records = unsafe { self.constant_assignments(&decl, &name) };
            extraction.commit(&name, records);
        }

        let num_funcs = unsafe { Z3_model_get_num_funcs(ctx, model) };
        for idx in 0..num_funcs {
            let decl = match unsafe { Native::acquire(self.ctx, Z3_model_get_func_decl(ctx, model, idx)) } {
                Ok(decl) => decl,
                Err(fault) => {
                    extraction.commit(&format!("function #{}", idx), Err(fault));
                    continue;
                }
            };
            let name = unsafe { raw::decl_name(ctx, decl.get()) };
            if is_internal_symbol(&name) {
                trace!("skipping internal function {}", name);
                continue;
            }
            let records = unsafe { self.function_assignments(&decl, &name) };
            extraction.commit(&name, records);
        }

        debug!(
            "extracted {} assignments over {} names, {} faults",
            extraction.records.len(),
            extraction.by_name.len(),
            extraction.faults.len()
        );
        extraction
    }

    unsafe fn constant_assignments(
        &self,
        decl: &Native<'ctx, Z3_func_decl>,
        name: &str,
    ) -> Result<Vec<ValueAssignment<'ctx>>> {
        let ctx = self.raw_context();
        if Z3_get_arity(ctx, decl.get()) != 0 {
            return Err(SolverError::unexpected(format!("{} is not a constant", name)));
        }
        let key = self.term(Z3_mk_app(ctx, decl.get(), 0, ptr::null()))?;
        let value = Native::acquire_optional(self.ctx, Z3_model_get_const_interp(ctx, self.model.get(), decl.get()))?
            .ok_or_else(|| self.does_not_matter(decl.get()))?;

        if codec::is_constant(ctx, value.get()) {
            let value = codec::convert_value(self.ctx, value.get())?;
            return Ok(vec![ValueAssignment::new(key, name, value, Vec::new())]);
        }
        if self.is_array_value(value.get()) {
            return self.unfold_array(name, key, value);
        }
        Err(SolverError::unexpected(format!(
            "unknown model evaluation: {}",
            raw::ast_to_string(ctx, value.get())
        )))
    }

    /// Breadth-first over nested arrays. Every frame is one array value
    /// reached through `indices`; nesting beyond the declared type is a fault.
    unsafe fn unfold_array(
        &self,
        name: &str,
        term: Formula<'ctx>,
        value: Native<'ctx, Z3_ast>,
    ) -> Result<Vec<ValueAssignment<'ctx>>> {
        let ctx = self.raw_context();
        let max_depth = term.formula_type().array_depth();
        let mut records = Vec::new();
        let mut worklist = VecDeque::new();
        worklist.push_back(ArrayFrame {
            term,
            value,
            indices: Vec::new(),
            depth: 1,
        });

        while let Some(frame) = worklist.pop_front() {
            if frame.depth > max_depth {
                return Err(SolverError::unexpected(format!(
                    "array value of {} nests deeper than its type allows",
                    name
                )));
            }
            for (index, element) in self.array_entries(&frame.value)? {
                let select = self.term(Z3_mk_select(ctx, frame.term.native(), index.get()))?;
                let mut indices = frame.indices.clone();
                indices.push(self.index_value(&index)?);

                if codec::is_constant(ctx, element.get()) {
                    let value = codec::convert_value(self.ctx, element.get())?;
                    records.push(ValueAssignment::new(select, name, value, indices));
                } else if self.is_array_value(element.get()) {
                    worklist.push_back(ArrayFrame {
                        term: select,
                        value: element,
                        indices,
                        depth: frame.depth + 1,
                    });
                }
            }
        }
        Ok(records)
    }

    /// Explicit `(index, element)` pairs of an array value: the entries of an
    /// `as-array` function, or the cells of a `store` chain over a constant
    /// array. The default element is not reported.
    unsafe fn array_entries(&self, value: &Native<'ctx, Z3_ast>) -> Result<Vec<Entry<'ctx>>> {
        let ctx = self.raw_context();
        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        let mut current = value.clone();

        loop {
            if Z3_is_as_array(ctx, current.get()) {
                for (index, element) in self.as_array_entries(current.get())? {
                    if seen.insert(Z3_get_ast_id(ctx, index.get())) {
                        entries.push((index, element));
                    }
                }
                return Ok(entries);
            }
            match raw::app_decl_kind(ctx, current.get()) {
                Some(DeclKind::CONST_ARRAY) => return Ok(entries),
                Some(DeclKind::STORE) => {
                    let app = Z3_to_app(ctx, current.get());
                    let array = Native::acquire(self.ctx, Z3_get_app_arg(ctx, app, 0))?;
                    let index = Native::acquire(self.ctx, Z3_get_app_arg(ctx, app, 1))?;
                    let element = Native::acquire(self.ctx, Z3_get_app_arg(ctx, app, 2))?;
                    // The outermost store of an index is the one that counts
                    if seen.insert(Z3_get_ast_id(ctx, index.get())) {
                        entries.push((index, element));
                    }
                    current = array;
                }
                _ => {
                    return Err(SolverError::unexpected(format!(
                        "unknown array value: {}",
                        raw::ast_to_string(ctx, current.get())
                    )))
                }
            }
        }
    }

    unsafe fn as_array_entries(&self, token: Z3_ast) -> Result<Vec<Entry<'ctx>>> {
        let ctx = self.raw_context();
        let decl = Native::acquire(self.ctx, Z3_get_as_array_func_decl(ctx, token))?;
        let interp = Native::acquire_optional(self.ctx, Z3_model_get_func_interp(ctx, self.model.get(), decl.get()))?
            .ok_or_else(|| self.does_not_matter(decl.get()))?;

        let num_entries = Z3_func_interp_get_num_entries(ctx, interp.get());
        let mut entries = Vec::with_capacity(num_entries as usize);
        for idx in 0..num_entries {
            let entry = Native::acquire(self.ctx, Z3_func_interp_get_entry(ctx, interp.get(), idx))?;
            let num_args = Z3_func_entry_get_num_args(ctx, entry.get());
            if num_args != 1 {
                return Err(SolverError::unexpected(format!(
                    "array entry of {} has {} indices",
                    raw::decl_to_string(ctx, decl.get()),
                    num_args
                )));
            }
            let index = Native::acquire(self.ctx, Z3_func_entry_get_arg(ctx, entry.get(), 0))?;
            let element = Native::acquire(self.ctx, Z3_func_entry_get_value(ctx, entry.get()))?;
            entries.push((index, element));
        }
        Ok(entries)
    }

    unsafe fn is_array_value(&self, ast: Z3_ast) -> bool {
        let ctx = self.raw_context();
        Z3_is_as_array(ctx, ast)
            || matches!(
                raw::app_decl_kind(ctx, ast),
                Some(DeclKind::STORE) | Some(DeclKind::CONST_ARRAY)
            )
    }

    unsafe fn index_value(&self, index: &Native<'ctx, Z3_ast>) -> Result<Value> {
        let ctx = self.raw_context();
        if codec::is_constant(ctx, index.get()) {
            return codec::convert_value(self.ctx, index.get());
        }
        self.evaluate_native(index.get())?.ok_or_else(|| {
            SolverError::unexpected(format!(
                "array index {} has no value",
                raw::ast_to_string(ctx, index.get())
            ))
        })
    }

    /// Entries of a function's interpretation. An interpretation without
    /// entries aliases another declaration through its `else` branch; the
    /// chain is followed as long as it runs through internal symbols.
    unsafe fn function_assignments(
        &self,
        decl: &Native<'ctx, Z3_func_decl>,
        name: &str,
    ) -> Result<Vec<ValueAssignment<'ctx>>> {
        let ctx = self.raw_context();
        let mut source = decl.clone();
        let mut visited = HashSet::new();

        loop {
            let id = Z3_get_ast_id(ctx, Z3_func_decl_to_ast(ctx, source.get()));
            if !visited.insert(id) {
                return Err(SolverError::unexpected(format!("alias chain of {} is cyclic", name)));
            }
            let interp = Native::acquire_optional(self.ctx, Z3_model_get_func_interp(ctx, self.model.get(), source.get()))?
                .ok_or_else(|| self.does_not_matter(source.get()))?;
            if Z3_func_interp_get_num_entries(ctx, interp.get()) > 0 {
                return self.function_entries(decl, name, &interp);
            }

            let otherwise = match Native::acquire_optional(self.ctx, Z3_func_interp_get_else(ctx, interp.get()))? {
                Some(otherwise) if Z3_is_app(ctx, otherwise.get()) => otherwise,
                _ => return Ok(Vec::new()),
            };
            let alias = Native::acquire(self.ctx, Z3_get_app_decl(ctx, Z3_to_app(ctx, otherwise.get())))?;
            let alias_name = raw::decl_name(ctx, alias.get());
            if !is_internal_symbol(&alias_name) {
                // ite, and, ... are not functions of the client
                trace!("{} is defined by {}, not an alias", name, alias_name);
                return Ok(Vec::new());
            }
            trace!("following alias {} -> {}", name, alias_name);
            source = alias;
        }
    }

    /// One record per entry whose value is a literal; other entries (arrays,
    /// unreduced terms) are skipped.
    unsafe fn function_entries(
        &self,
        decl: &Native<'ctx, Z3_func_decl>,
        name: &str,
        interp: &Native<'ctx, Z3_func_interp>,
    ) -> Result<Vec<ValueAssignment<'ctx>>> {
        let ctx = self.raw_context();
        let arity = Z3_get_arity(ctx, decl.get());
        let num_entries = Z3_func_interp_get_num_entries(ctx, interp.get());
        let mut records = Vec::with_capacity(num_entries as usize);

        for idx in 0..num_entries {
            let entry = Native::acquire(self.ctx, Z3_func_interp_get_entry(ctx, interp.get(), idx))?;
            let value = Native::acquire(self.ctx, Z3_func_entry_get_value(ctx, entry.get()))?;
            if !codec::is_constant(ctx, value.get()) {
                continue;
            }
            let num_args = Z3_func_entry_get_num_args(ctx, entry.get());
            if num_args != arity {
                return Err(SolverError::unexpected(format!(
                    "entry of {} has {} arguments, expected {}",
                    name, num_args, arity
                )));
            }

            let mut args = Vec::with_capacity(num_args as usize);
            let mut arguments = Vec::with_capacity(num_args as usize);
            for arg_idx in 0..num_args {
                let arg = Native::acquire(self.ctx, Z3_func_entry_get_arg(ctx, entry.get(), arg_idx))?;
                arguments.push(codec::convert_value(self.ctx, arg.get())?);
                args.push(arg);
            }
            let raw_args: Vec<Z3_ast> = args.iter().map(Native::get).collect();
            let key = self.term(Z3_mk_app(ctx, decl.get(), num_args, raw_args.as_ptr()))?;
            let value = codec::convert_value(self.ctx, value.get())?;
            records.push(ValueAssignment::new(key, name, value, arguments));
        }
        Ok(records)
    }

    unsafe fn evaluate_native(&self, ast: Z3_ast) -> Result<Option<Value>> {
        let ctx = self.raw_context();
        let mut out: Z3_ast = ptr::null_mut();
        if !Z3_model_eval(ctx, self.model.get(), ast, false, &mut out) {
            check_error(ctx)?;
            return Err(SolverError::unexpected(format!(
                "engine could not evaluate {}",
                raw::ast_to_string(ctx, ast)
            )));
        }
        let result = Native::acquire(self.ctx, out)?;
        if codec::is_constant(ctx, result.get()) {
            return codec::convert_value(self.ctx, result.get()).map(Some);
        }
        trace!(
            "{} evaluates to {}, treating it as irrelevant",
            raw::ast_to_string(ctx, ast),
            raw::ast_to_string(ctx, result.get())
        );
        Ok(None)
    }

    // A term the engine just built, checked and wrapped.
    unsafe fn term(&self, ast: Z3_ast) -> Result<Formula<'ctx>> {
        check_error(self.raw_context())?;
        if ast.is_null() {
            return Err(SolverError::unexpected("engine returned a null term"));
        }
        Ok(Formula::wrap(self.ctx, ast)?)
    }

    unsafe fn does_not_matter(&self, decl: Z3_func_decl) -> SolverError {
        SolverError::unexpected(format!(
            "engine unexpectedly claims that the value of {} does not matter in the model",
            raw::decl_to_string(self.raw_context(), decl)
        ))
    }
}

impl<'a, 'ctx> IntoIterator for &'a Model<'ctx> {
    type Item = &'a ValueAssignment<'ctx>;
    type IntoIter = std::slice::Iter<'a, ValueAssignment<'ctx>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The engine's own rendering; not a stable format.
impl<'ctx> fmt::Display for Model<'ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = unsafe { raw::c_string(Z3_model_to_string(self.raw_context(), self.model.get())) };
        write!(f, "{}", text)
    }
}

impl<'ctx> fmt::Debug for Model<'ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.assignments()).finish()
    }
}
