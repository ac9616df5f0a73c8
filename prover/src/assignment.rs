use std::fmt;

use formula::{Formula, FormulaError, FormulaManager};

use crate::value::Value;

/// One fact read from a model.
///
/// `key` is the term the fact is about: the constant itself, the function
/// application over the argument literals, or the `select` chain over the
/// indices. `arguments` holds one value per function parameter, or one index
/// per array nesting level, and is empty for constants.
#[derive(Clone)]
pub struct ValueAssignment<'ctx> {
    key: Formula<'ctx>,
    name: String,
    value: Value,
    arguments: Vec<Value>,
}

impl<'ctx> ValueAssignment<'ctx> {
    pub fn new(key: Formula<'ctx>, name: impl Into<String>, value: Value, arguments: Vec<Value>) -> Self {
        ValueAssignment {
            key,
            name: name.into(),
            value,
            arguments,
        }
    }

    pub fn key(&self) -> &Formula<'ctx> {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    pub fn is_function(&self) -> bool {
        !self.arguments.is_empty()
    }

    /// `key = value`, ready to be asserted.
    pub fn as_equality(&self, fmgr: &FormulaManager<'ctx>) -> Result<Formula<'ctx>, FormulaError> {
        let literal = self.value.to_formula(fmgr, self.key.formula_type())?;
        fmgr.equal(&self.key, &literal)
    }
}

impl<'ctx> PartialEq for ValueAssignment<'ctx> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.name == other.name
            && self.value == other.value
            && self.arguments == other.arguments
    }
}

impl<'ctx> fmt::Display for ValueAssignment<'ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.arguments.is_empty() {
            let args: Vec<String> = self.arguments.iter().map(Value::to_string).collect();
            write!(f, "({})", args.join(", "))?;
        }
        write!(f, " = {}", self.value)
    }
}

impl<'ctx> fmt::Debug for ValueAssignment<'ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueAssignment")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("value", &self.value)
            .field("arguments", &self.arguments)
            .finish()
    }
}
