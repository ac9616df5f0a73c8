#![allow(dead_code)]

use prover::{ProverOption, ProverSession, SolverConfig, SolverContext};
use z3::Context;

pub fn z3_context() -> Context {
    Context::new(&SolverConfig::default().z3_config())
}

pub fn solver_context(ctx: &Context) -> SolverContext<'_> {
    SolverContext::new(ctx, SolverConfig::default())
}

/// A session that can hand out models.
pub fn session<'ctx>(context: &SolverContext<'ctx>) -> ProverSession<'ctx> {
    context
        .new_prover_environment(&[ProverOption::GenerateModels])
        .expect("session")
}

pub fn session_with<'ctx>(context: &SolverContext<'ctx>, options: &[ProverOption]) -> ProverSession<'ctx> {
    context.new_prover_environment(options).expect("session")
}
