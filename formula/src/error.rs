use thiserror::Error;

use crate::types::FormulaType;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormulaError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: String,
        found: FormulaType,
    },

    #[error("function {name} expects {expected} arguments, got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid literal for {ty}: {literal}")]
    InvalidLiteral {
        ty: FormulaType,
        literal: String,
    },

    #[error("unsupported sort: {0}")]
    UnsupportedSort(String),

    #[error("term is not a variable: {0}")]
    NotAVariable(String),

    #[error("bitvector width must be positive")]
    ZeroWidth,
}

impl FormulaError {
    pub(crate) fn mismatch(expected: impl Into<String>, found: &FormulaType) -> Self {
        FormulaError::TypeMismatch {
            expected: expected.into(),
            found: found.clone(),
        }
    }
}
