use serde::{Deserialize, Serialize};

use super::op::Op;

/// Compiled code of one function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCode {
    pub name: String,
    pub arity: usize,
    /// Number of captured values, stored in the first slots.
    pub captures: usize,
    /// Frame size: captures, parameters and locals.
    pub locals: usize,
    pub code: Vec<Op>,
}

/// Output of the bytecode generator for one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub module: String,
    pub functions: Vec<FunctionCode>,
}

impl Program {
    pub fn function(&self, name: &str) -> Option<&FunctionCode> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(raw: &str) -> Result<Program, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
