use std::fmt;

use formula::{Formula, FormulaError, FormulaManager, FormulaType};
use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;

/// A literal read back from a model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Bool(bool),
    Int(BigInt),
    Rational(BigRational),
    Bitvector { value: BigUint, width: u32 },
    /// Not a simple literal, e.g. an element of an uninterpreted sort. Holds
    /// the engine's rendering.
    Opaque(String),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    /// Integers are exact rationals too.
    pub fn as_rational(&self) -> Option<BigRational> {
        match self {
            Value::Int(i) => Some(BigRational::from_integer(i.clone())),
            Value::Rational(r) => Some(r.clone()),
            _ => None,
        }
    }

    pub fn as_bitvector(&self) -> Option<(&BigUint, u32)> {
        match self {
            Value::Bitvector { value, width } => Some((value, *width)),
            _ => None,
        }
    }

    /// Builds the literal term of type `ty` for this value.
    pub fn to_formula<'ctx>(
        &self,
        fmgr: &FormulaManager<'ctx>,
        ty: &FormulaType,
    ) -> Result<Formula<'ctx>, FormulaError> {
        match (self, ty) {
            (Value::Bool(b), FormulaType::Boolean) => Ok(fmgr.make_boolean(*b)),
            (Value::Int(i), FormulaType::Integer) => fmgr.make_integer(i),
            (Value::Int(i), FormulaType::Rational) => {
                fmgr.make_rational(&BigRational::from_integer(i.clone()))
            }
            (Value::Rational(r), FormulaType::Rational) => fmgr.make_rational(r),
            (Value::Bitvector { value, width }, FormulaType::Bitvector(w)) if width == w => {
                fmgr.make_bitvector_unsigned(*width, value)
            }
            _ => Err(FormulaError::InvalidLiteral {
                ty: ty.clone(),
                literal: self.to_string(),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Rational(r) => write!(f, "{}", r),
            Value::Bitvector { value, width } => write!(f, "#b{:0>width$}", value.to_str_radix(2), width = *width as usize),
            Value::Opaque(text) => write!(f, "{}", text),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(BigInt::from(i))
    }
}

impl From<BigInt> for Value {
    fn from(i: BigInt) -> Self {
        Value::Int(i)
    }
}

impl From<BigRational> for Value {
    fn from(r: BigRational) -> Self {
        Value::Rational(r)
    }
}
