use serde::{Deserialize, Serialize};

use crate::ir::value::Value;

type Slot = u16;

/// Stack-machine instruction. Branch targets are op indices within the
/// function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op {
    Const { value: Value },

    Load { slot: Slot },
    Store { slot: Slot },

    Add,
    Sub,
    Mul,
    Div,
    Mod,

    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Not,
    Neg,

    Dup,
    Pop,

    Jump { target: usize },
    BrTrue { target: usize },
    BrFalse { target: usize },

    Call { function: String, argc: usize },
    CallBuiltin { name: String, argc: usize },
    CallClosure { slot: Slot, argc: usize },
    MakeClosure { function: String, captures: Vec<Slot> },
    Ret,
}

impl Op {
    pub fn branch_target(&self) -> Option<usize> {
        match self {
            Op::Jump { target } | Op::BrTrue { target } | Op::BrFalse { target } => Some(*target),
            _ => None,
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::Const { value } => write!(f, "Const {}", value),
            Op::Load { slot } => write!(f, "Load local[{}]", slot),
            Op::Store { slot } => write!(f, "Store local[{}]", slot),
            Op::Add => write!(f, "Add"),
            Op::Sub => write!(f, "Sub"),
            Op::Mul => write!(f, "Mul"),
            Op::Div => write!(f, "Div"),
            Op::Mod => write!(f, "Mod"),
            Op::Eq => write!(f, "Eq"),
            Op::Neq => write!(f, "Neq"),
            Op::Lt => write!(f, "Lt"),
            Op::Lte => write!(f, "Lte"),
            Op::Gt => write!(f, "Gt"),
            Op::Gte => write!(f, "Gte"),
            Op::Not => write!(f, "Not"),
            Op::Neg => write!(f, "Neg"),
            Op::Dup => write!(f, "Dup"),
            Op::Pop => write!(f, "Pop"),
            Op::Jump { target } => write!(f, "Jump {}", target),
            Op::BrTrue { target } => write!(f, "BrTrue -> {}", target),
            Op::BrFalse { target } => write!(f, "BrFalse -> {}", target),
            Op::Call { function, argc } => write!(f, "Call {}/{}", function, argc),
            Op::CallBuiltin { name, argc } => write!(f, "CallBuiltin {}/{}", name, argc),
            Op::CallClosure { slot, argc } => write!(f, "CallClosure local[{}]/{}", slot, argc),
            Op::MakeClosure { function, captures } => {
                write!(f, "MakeClosure {} [", function)?;
                for (i, slot) in captures.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "local[{}]", slot)?;
                }
                write!(f, "]")
            }
            Op::Ret => write!(f, "Ret"),
        }
    }
}
