use std::fmt;

use formula::FormulaError;
use thiserror::Error;

/// Optional features a prover environment may or may not offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    MultipleStacks,
    NonLinearArithmetic,
    UnsatCore,
    Quantifiers,
    Arrays,
    Bitvectors,
    Rationals,
    Interpolation,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::MultipleStacks => "multiple assertion stacks",
            Capability::NonLinearArithmetic => "non-linear arithmetic",
            Capability::UnsatCore => "unsat cores",
            Capability::Quantifiers => "quantifiers",
            Capability::Arrays => "arrays",
            Capability::Bitvectors => "bitvectors",
            Capability::Rationals => "rationals",
            Capability::Interpolation => "interpolation",
        };
        write!(f, "{}", name)
    }
}

/// Per-session switches, fixed when the session is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProverOption {
    GenerateModels,
    GenerateUnsatCore,
    GenerateUnsatCoreOverAssumptions,
}

impl fmt::Display for ProverOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProverOption::GenerateModels => "GENERATE_MODELS",
            ProverOption::GenerateUnsatCore => "GENERATE_UNSAT_CORE",
            ProverOption::GenerateUnsatCoreOverAssumptions => "GENERATE_UNSAT_CORE_OVER_ASSUMPTIONS",
        };
        write!(f, "{}", name)
    }
}

/// Coarse classification, for callers deciding between skipping, retrying
/// and failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller broke a protocol rule.
    Usage,
    /// The engine handed back something the extractor cannot account for.
    Internal,
    /// The backend lacks a feature; probe with `supports` and skip.
    Unsupported,
    /// A check was cancelled through the interrupt handle.
    Interrupted,
    /// The engine gave up without an answer.
    Incomplete,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("cannot pop: the assertion stack is empty")]
    EmptyStack,

    #[error("no model available: the last check was not satisfiable or the stack changed since")]
    NoModel,

    #[error("no unsat core available: the last check was not unsatisfiable")]
    NoUnsatCore,

    #[error("prover option {0} was not enabled for this session")]
    OptionNotEnabled(ProverOption),

    #[error("the prover session is closed")]
    Closed,

    #[error(transparent)]
    Formula(#[from] FormulaError),

    #[error("unexpected engine state: {0}")]
    UnexpectedEngineState(String),

    #[error("engine error {code}: {message}")]
    Engine { code: String, message: String },

    #[error("{0} not supported by this engine")]
    Unsupported(Capability),

    #[error("satisfiability check was interrupted")]
    Interrupted,

    #[error("engine returned unknown: {0}")]
    Unknown(String),
}

impl SolverError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SolverError::EmptyStack
            | SolverError::NoModel
            | SolverError::NoUnsatCore
            | SolverError::OptionNotEnabled(_)
            | SolverError::Closed
            | SolverError::Formula(_) => ErrorKind::Usage,
            SolverError::UnexpectedEngineState(_) | SolverError::Engine { .. } => ErrorKind::Internal,
            SolverError::Unsupported(_) => ErrorKind::Unsupported,
            SolverError::Interrupted => ErrorKind::Interrupted,
            SolverError::Unknown(_) => ErrorKind::Incomplete,
        }
    }

    pub(crate) fn unexpected(message: impl Into<String>) -> Self {
        SolverError::UnexpectedEngineState(message.into())
    }
}

pub type Result<T> = std::result::Result<T, SolverError>;
