use std::ffi::CString;

use z3::{Config, Context};
use z3_sys::*;

use crate::error::{Result, SolverError};
use crate::native::{check_error, Native};

/// Engine settings shared by every session of a context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    pub generate_models: bool,
    pub random_seed: u32,
    /// Per check; `None` waits forever.
    pub timeout_ms: Option<u32>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            generate_models: true,
            random_seed: 42,
            timeout_ms: None,
        }
    }
}

impl SolverConfig {
    /// Context-wide settings. Seed and timeout are applied per solver, see
    /// [`SolverConfig::apply`].
    pub fn z3_config(&self) -> Config {
        let mut cfg = Config::new();
        cfg.set_model_generation(self.generate_models);
        if let Some(timeout) = self.timeout_ms {
            cfg.set_timeout_msec(u64::from(timeout));
        }
        cfg
    }

    pub(crate) fn apply(&self, ctx: &Context, solver: &Native<'_, Z3_solver>) -> Result<()> {
        let raw_ctx = solver.raw_context();
        unsafe {
            let params = Native::acquire(ctx, Z3_mk_params(raw_ctx))?;
            Z3_params_set_uint(raw_ctx, params.get(), symbol(raw_ctx, "random_seed")?, self.random_seed);
            if let Some(timeout) = self.timeout_ms {
                Z3_params_set_uint(raw_ctx, params.get(), symbol(raw_ctx, "timeout")?, timeout);
            }
            Z3_solver_set_params(raw_ctx, solver.get(), params.get());
        }
        check_error(raw_ctx)
    }
}

unsafe fn symbol(ctx: Z3_context, name: &str) -> Result<Z3_symbol> {
    let name = CString::new(name).map_err(|_| SolverError::unexpected("parameter name contains NUL"))?;
    Ok(Z3_mk_string_symbol(ctx, name.as_ptr()))
}
