use formula::{raw, FormulaManager};
use log::debug;
use z3::{Context, ContextHandle};
use z3_sys::*;

use crate::config::SolverConfig;
use crate::error::{Capability, ProverOption, Result, SolverError};
use crate::native::Native;
use crate::session::ProverSession;

/// Entry point: the formula manager plus a factory for prover sessions, all
/// on one engine context.
pub struct SolverContext<'ctx> {
    ctx: &'ctx Context,
    fmgr: FormulaManager<'ctx>,
    config: SolverConfig,
}

impl<'ctx> SolverContext<'ctx> {
    /// `ctx` should come from [`SolverConfig::z3_config`] of the same config.
    pub fn new(ctx: &'ctx Context, config: SolverConfig) -> Self {
        // Errors are read back after each call instead of aborting
        unsafe { Z3_set_error_handler(raw::raw_context(ctx), None) };
        debug!("solver context on {} with {:?}", version(), config);
        SolverContext {
            ctx,
            fmgr: FormulaManager::new(ctx),
            config,
        }
    }

    pub fn formula_manager(&self) -> &FormulaManager<'ctx> {
        &self.fmgr
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn context(&self) -> &'ctx Context {
        self.ctx
    }

    /// A new session with its own native solver.
    pub fn new_prover_environment(&self, options: &[ProverOption]) -> Result<ProverSession<'ctx>> {
        let raw_ctx = raw::raw_context(self.ctx);
        let solver = unsafe { Native::acquire(self.ctx, Z3_mk_solver(raw_ctx)) }?;
        self.config.apply(self.ctx, &solver)?;
        debug!("new prover environment with {:?}", options);
        Ok(ProverSession::new(self.ctx, solver, options, self.config.timeout_ms))
    }

    pub fn new_prover_environment_with_interpolation(&self) -> Result<ProverSession<'ctx>> {
        Err(SolverError::Unsupported(Capability::Interpolation))
    }

    pub fn supports(&self, capability: Capability) -> bool {
        !matches!(capability, Capability::Interpolation)
    }

    /// Cancels running checks on this context from another thread.
    pub fn interrupt_handle(&self) -> ContextHandle<'ctx> {
        self.ctx.handle()
    }

    pub fn version(&self) -> String {
        version()
    }
}

fn version() -> String {
    raw::c_string(unsafe { Z3_get_full_version() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities() {
        let config = SolverConfig::default();
        let ctx = Context::new(&config.z3_config());
        let context = SolverContext::new(&ctx, config);

        assert!(context.supports(Capability::MultipleStacks));
        assert!(context.supports(Capability::UnsatCore));
        assert!(!context.supports(Capability::Interpolation));
        let err = context.new_prover_environment_with_interpolation().err().unwrap();
        assert_eq!(err, SolverError::Unsupported(Capability::Interpolation));
        assert!(context.version().starts_with("Z3"));
    }
}
