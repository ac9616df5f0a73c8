//! Typed formula construction on top of the `z3` crate.
//!
//! Every formula carries its theory type, so operations check their operands
//! up front and report a [`FormulaError`] instead of handing an ill-sorted term
//! to the engine.

pub mod error;
pub mod macros;
pub mod manager;
pub mod raw;
pub mod types;
pub mod visitor;

pub use error::FormulaError;
pub use manager::{FormulaManager, Signature};
pub use types::{Formula, FormulaType, FunctionDeclaration};
pub use visitor::{BooleanFormulaVisitor, Quantifier};
