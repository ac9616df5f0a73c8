use std::collections::HashSet;
use std::time::{Duration, Instant};

use formula::{Formula, FormulaError, FormulaType};
use log::{debug, info};
use z3::Context;
use z3_sys::*;

use crate::assignment::ValueAssignment;
use crate::error::{ProverOption, Result, SolverError};
use crate::model::Model;
use crate::native::{check_error, Native};
use crate::stack::AssertionStack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    /// Nothing checked since the last change to the stack.
    Unchecked,
    Sat,
    Unsat,
}

struct Open<'ctx> {
    // Dropped before the stack, so the model goes before the solver
    model: Option<Model<'ctx>>,
    stack: AssertionStack<'ctx>,
    status: Status,
}

/// One incremental assertion stack on a native solver, plus the model of the
/// last satisfiable check.
///
/// Sessions on the same context are independent: each owns its own solver,
/// and only declarations are shared. After [`ProverSession::close`] every
/// operation fails with [`SolverError::Closed`].
pub struct ProverSession<'ctx> {
    ctx: &'ctx Context,
    options: HashSet<ProverOption>,
    timeout: Option<Duration>,
    open: Option<Open<'ctx>>,
}

impl<'ctx> ProverSession<'ctx> {
    pub(crate) fn new(
        ctx: &'ctx Context,
        solver: Native<'ctx, Z3_solver>,
        options: &[ProverOption],
        timeout_ms: Option<u32>,
    ) -> Self {
        let options: HashSet<ProverOption> = options.iter().copied().collect();
        let track = options.contains(&ProverOption::GenerateUnsatCore);
        ProverSession {
            ctx,
            options,
            timeout: timeout_ms.map(|ms| Duration::from_millis(u64::from(ms))),
            open: Some(Open {
                model: None,
                stack: AssertionStack::new(ctx, solver, track),
                status: Status::Unchecked,
            }),
        }
    }

    pub fn has_option(&self, option: ProverOption) -> bool {
        self.options.contains(&option)
    }

    pub fn is_closed(&self) -> bool {
        self.open.is_none()
    }

    pub fn depth(&self) -> Result<usize> {
        Ok(self.state()?.stack.depth())
    }

    /****************************
    *
    *   Stack
    *
    ****************************/

    /// Opens a new, empty level.
    pub fn push(&mut self) -> Result<()> {
        self.changing()?.stack.push()
    }

    /// Opens a new level holding `formula`; the matching `pop` removes it.
    pub fn push_formula(&mut self, formula: &Formula<'ctx>) -> Result<()> {
        self.push()?;
        self.add_constraint(formula)
    }

    /// Asserts `formula` into the current level without opening a new one.
    pub fn add_constraint(&mut self, formula: &Formula<'ctx>) -> Result<()> {
        self.changing()?.stack.add_constraint(formula)
    }

    pub fn pop(&mut self) -> Result<()> {
        let open = self.state_mut()?;
        if open.stack.depth() == 0 {
            return Err(SolverError::EmptyStack);
        }
        invalidate(open);
        open.stack.pop()
    }

    /// Every asserted formula, grouped by level, base level first.
    pub fn assertions(&self) -> Result<Vec<Vec<Formula<'ctx>>>> {
        Ok(self.state()?.stack.levels().to_vec())
    }

    /****************************
    *
    *   Checks
    *
    ****************************/

    /// Fails with [`SolverError::Interrupted`] when the check was cancelled
    /// through the context's interrupt handle, and with
    /// [`SolverError::Unknown`] for any other undecided answer, timeouts
    /// included.
    pub fn is_satisfiable(&mut self) -> Result<bool> {
        let timeout = self.timeout;
        let open = self.changing()?;
        let solver = open.stack.solver();
        let started = Instant::now();
        let answer = unsafe { Z3_solver_check(solver.raw_context(), solver.get()) };
        record(open, answer, timed_out(timeout, started))
    }

    pub fn is_unsat(&mut self) -> Result<bool> {
        Ok(!self.is_satisfiable()?)
    }

    /// Checks the stack together with `assumptions`, which are not asserted.
    pub fn is_unsat_with_assumptions(&mut self, assumptions: &[Formula<'ctx>]) -> Result<bool> {
        for assumption in assumptions {
            if assumption.formula_type() != &FormulaType::Boolean {
                return Err(FormulaError::TypeMismatch {
                    expected: "Boolean".to_owned(),
                    found: assumption.formula_type().clone(),
                }
                .into());
            }
        }
        let timeout = self.timeout;
        let open = self.changing()?;
        let solver = open.stack.solver();
        let raw: Vec<Z3_ast> = assumptions.iter().map(Formula::native).collect();
        let started = Instant::now();
        let answer = unsafe {
            Z3_solver_check_assumptions(solver.raw_context(), solver.get(), raw.len() as u32, raw.as_ptr())
        };
        Ok(!record(open, answer, timed_out(timeout, started))?)
    }

    /// The model of the last check. Fails unless that check was satisfiable
    /// and the stack has not changed since.
    pub fn get_model(&mut self) -> Result<&Model<'ctx>> {
        self.state()?;
        if !self.has_option(ProverOption::GenerateModels) {
            return Err(SolverError::OptionNotEnabled(ProverOption::GenerateModels));
        }
        let ctx = self.ctx;
        let open = self.state_mut()?;
        if open.status != Status::Sat {
            return Err(SolverError::NoModel);
        }
        if open.model.is_none() {
            let solver = open.stack.solver();
            let native = unsafe { Native::acquire(ctx, Z3_solver_get_model(solver.raw_context(), solver.get())) }?;
            open.model = Some(Model::new(ctx, native, open.stack.hidden_names()));
        }
        open.model.as_ref().ok_or(SolverError::NoModel)
    }

    /// An owned copy of the model's records.
    pub fn model_assignments(&mut self) -> Result<Vec<ValueAssignment<'ctx>>> {
        Ok(self.get_model()?.assignments().to_vec())
    }

    /// Assertions that together are already unsatisfiable, after an
    /// unsatisfiable check.
    pub fn unsat_core(&self) -> Result<Vec<Formula<'ctx>>> {
        self.state()?;
        if !self.has_option(ProverOption::GenerateUnsatCore) {
            return Err(SolverError::OptionNotEnabled(ProverOption::GenerateUnsatCore));
        }
        self.core()
    }

    /// `None` if the stack is satisfiable under `assumptions`, otherwise a
    /// subset of the assumptions that is already unsatisfiable.
    pub fn unsat_core_over_assumptions(
        &mut self,
        assumptions: &[Formula<'ctx>],
    ) -> Result<Option<Vec<Formula<'ctx>>>> {
        self.state()?;
        if !self.has_option(ProverOption::GenerateUnsatCoreOverAssumptions) {
            return Err(SolverError::OptionNotEnabled(
                ProverOption::GenerateUnsatCoreOverAssumptions,
            ));
        }
        if !self.is_unsat_with_assumptions(assumptions)? {
            return Ok(None);
        }
        self.core().map(Some)
    }

    fn core(&self) -> Result<Vec<Formula<'ctx>>> {
        let ctx = self.ctx;
        let open = self.state()?;
        if open.status != Status::Unsat {
            return Err(SolverError::NoUnsatCore);
        }
        let solver = open.stack.solver();
        let raw_ctx = solver.raw_context();
        unsafe {
            let core = Native::acquire(ctx, Z3_solver_get_unsat_core(raw_ctx, solver.get()))?;
            let size = Z3_ast_vector_size(raw_ctx, core.get());
            let mut formulas = Vec::with_capacity(size as usize);
            for idx in 0..size {
                let literal = Native::acquire(ctx, Z3_ast_vector_get(raw_ctx, core.get(), idx))?;
                formulas.push(open.stack.resolve_core_literal(literal.get())?);
            }
            debug!("unsat core of {} formulas", formulas.len());
            Ok(formulas)
        }
    }

    /****************************
    *
    *   Lifecycle
    *
    ****************************/

    /// Releases the model, then the solver. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(open) = self.open.take() {
            let Open { model, stack, .. } = open;
            drop(model);
            drop(stack);
            debug!("session closed");
        }
    }

    fn state(&self) -> Result<&Open<'ctx>> {
        self.open.as_ref().ok_or(SolverError::Closed)
    }

    fn state_mut(&mut self) -> Result<&mut Open<'ctx>> {
        self.open.as_mut().ok_or(SolverError::Closed)
    }

    // Open state for an operation that invalidates the last answer.
    fn changing(&mut self) -> Result<&mut Open<'ctx>> {
        let open = self.state_mut()?;
        invalidate(open);
        Ok(open)
    }
}

impl<'ctx> Drop for ProverSession<'ctx> {
    fn drop(&mut self) {
        self.close();
    }
}

fn invalidate(open: &mut Open<'_>) {
    open.model = None;
    open.status = Status::Unchecked;
}

fn timed_out(timeout: Option<Duration>, started: Instant) -> bool {
    timeout.map_or(false, |limit| started.elapsed() >= limit)
}

fn record(open: &mut Open<'_>, answer: Z3_lbool, timed_out: bool) -> Result<bool> {
    let solver = open.stack.solver();
    let ctx = solver.raw_context();
    check_error(ctx)?;
    match answer {
        Z3_L_TRUE => {
            open.status = Status::Sat;
            debug!("check at depth {}: sat", open.stack.depth());
            Ok(true)
        }
        Z3_L_FALSE => {
            open.status = Status::Unsat;
            debug!("check at depth {}: unsat", open.stack.depth());
            Ok(false)
        }
        Z3_L_UNDEF => {
            let reason = formula::raw::c_string(unsafe { Z3_solver_get_reason_unknown(ctx, solver.get()) });
            Err(classify_unknown(reason, timed_out))
        }
        other => unreachable!("engine returned an invalid Z3_lbool: {other}"),
    }
}

/// Maps the engine's reason for an undecided check to an error.
///
/// The engine stops a check that runs out of time through the same
/// cancellation as an interrupt, so its reason reads "canceled" in both
/// cases. A cancellation after the configured timeout has elapsed counts as
/// a timeout.
fn classify_unknown(reason: String, timed_out: bool) -> SolverError {
    let lowered = reason.to_lowercase();
    let cancelled = lowered.contains("cancel") || lowered.contains("interrupt");
    if cancelled && !timed_out && !lowered.contains("timeout") {
        info!("check interrupted: {}", reason);
        SolverError::Interrupted
    } else {
        debug!("check undecided: {}", reason);
        SolverError::Unknown(reason)
    }
}
