use std::collections::{HashMap, HashSet};

use formula::{raw, Formula, FormulaError, FormulaType};
use log::debug;
use z3::ast::{Ast, Bool};
use z3::Context;
use z3_sys::*;

use crate::error::{Result, SolverError};
use crate::native::{check_error, Native};

/// Push/pop levels of asserted formulas over one native solver.
///
/// The engine holds the real state; the levels mirror it so that depth and
/// contents can be reported without asking the engine. Declarations are not
/// part of any level: they live in the formula manager and survive every pop.
pub struct AssertionStack<'ctx> {
    ctx: &'ctx Context,
    solver: Native<'ctx, Z3_solver>,
    levels: Vec<Vec<Formula<'ctx>>>,
    // Tracking literal name -> the assertion it stands for
    trackers: Option<HashMap<String, Formula<'ctx>>>,
}

impl<'ctx> AssertionStack<'ctx> {
    /// With `track` set, every assertion gets a hidden literal so that unsat
    /// cores can be reported in terms of the original assertions.
    pub fn new(ctx: &'ctx Context, solver: Native<'ctx, Z3_solver>, track: bool) -> Self {
        AssertionStack {
            ctx,
            solver,
            levels: vec![Vec::new()],
            trackers: if track { Some(HashMap::new()) } else { None },
        }
    }

    /// Number of unmatched `push`es.
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn push(&mut self) -> Result<()> {
        let ctx = self.solver.raw_context();
        unsafe { Z3_solver_push(ctx, self.solver.get()) };
        check_error(ctx)?;
        self.levels.push(Vec::new());
        debug!("push: depth {}", self.depth());
        Ok(())
    }

    /// Asserts into the current level.
    pub fn add_constraint(&mut self, formula: &Formula<'ctx>) -> Result<()> {
        if formula.formula_type() != &FormulaType::Boolean {
            return Err(FormulaError::TypeMismatch {
                expected: "Boolean".to_owned(),
                found: formula.formula_type().clone(),
            }
            .into());
        }
        let ctx = self.solver.raw_context();
        match self.trackers.as_mut() {
            Some(trackers) => {
                let tracker = Bool::fresh_const(self.ctx, "track");
                unsafe { Z3_solver_assert_and_track(ctx, self.solver.get(), formula.native(), tracker.get_z3_ast()) };
                check_error(ctx)?;
                let name = unsafe { raw::ast_to_string(ctx, tracker.get_z3_ast()) };
                trackers.insert(name, formula.clone());
            }
            None => {
                unsafe { Z3_solver_assert(ctx, self.solver.get(), formula.native()) };
                check_error(ctx)?;
            }
        }
        self.levels
            .last_mut()
            .ok_or(SolverError::EmptyStack)?
            .push(formula.clone());
        debug!("assert at depth {}: {}", self.depth(), formula);
        Ok(())
    }

    /// Drops the top level and everything asserted into it. The base level
    /// cannot be popped.
    pub fn pop(&mut self) -> Result<()> {
        if self.depth() == 0 {
            return Err(SolverError::EmptyStack);
        }
        let ctx = self.solver.raw_context();
        unsafe { Z3_solver_pop(ctx, self.solver.get(), 1) };
        check_error(ctx)?;
        self.levels.pop();
        debug!("pop: depth {}", self.depth());
        Ok(())
    }

    /// Formulas per level, base level first.
    pub fn levels(&self) -> &[Vec<Formula<'ctx>>] {
        &self.levels
    }

    pub fn assertions(&self) -> impl Iterator<Item = &Formula<'ctx>> {
        self.levels.iter().flatten()
    }

    /// Names of the tracking literals, which models must not report.
    pub fn hidden_names(&self) -> HashSet<String> {
        self.trackers
            .as_ref()
            .map(|trackers| trackers.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// The assertion a core literal stands for: the tracked assertion for a
    /// tracking literal, the literal itself otherwise.
    ///
    /// # Safety
    ///
    /// `literal` must be a live boolean term of this stack's context.
    pub unsafe fn resolve_core_literal(&self, literal: Z3_ast) -> Result<Formula<'ctx>> {
        if let Some(trackers) = &self.trackers {
            let name = raw::ast_to_string(self.solver.raw_context(), literal);
            if let Some(tracked) = trackers.get(&name) {
                return Ok(tracked.clone());
            }
        }
        Ok(Formula::wrap(self.ctx, literal)?)
    }

    pub(crate) fn solver(&self) -> &Native<'ctx, Z3_solver> {
        &self.solver
    }
}
