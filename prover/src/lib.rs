//! Incremental proving on top of the engine: assertion stacks, satisfiability
//! checks, unsat cores, and models read back as plain [`ValueAssignment`]s.
//!
//! ```no_run
//! use prover::{ProverOption, SolverConfig, SolverContext};
//! use formula::FormulaType;
//!
//! let config = SolverConfig::default();
//! let ctx = z3::Context::new(&config.z3_config());
//! let context = SolverContext::new(&ctx, config);
//! let fmgr = context.formula_manager();
//!
//! let a = fmgr.make_variable("a", FormulaType::Integer).unwrap();
//! let lower = fmgr.less_than(&fmgr.make_int(0), &a).unwrap();
//! let upper = fmgr.less_than(&a, &fmgr.make_int(2)).unwrap();
//!
//! let mut prover = context.new_prover_environment(&[ProverOption::GenerateModels]).unwrap();
//! prover.add_constraint(&fmgr.and(&[lower, upper]).unwrap()).unwrap();
//! assert!(prover.is_satisfiable().unwrap());
//! for assignment in prover.get_model().unwrap() {
//!     println!("{}", assignment);
//! }
//! ```

pub mod assignment;
pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod model;
pub mod native;
pub mod session;
pub mod stack;
pub mod value;

pub use assignment::ValueAssignment;
pub use config::SolverConfig;
pub use context::SolverContext;
pub use error::{Capability, ErrorKind, ProverOption, Result, SolverError};
pub use model::Model;
pub use session::ProverSession;
pub use stack::AssertionStack;
pub use value::Value;
