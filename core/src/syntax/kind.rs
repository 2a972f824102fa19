//! file: core/src/syntax/kind.rs
//! description: raw syntax node kinds.
//!
//! `SyntaxKind` is the closed set of constructs the parser recognises. It
//! keeps operators as source text; mapping them onto IR operators is the IR
//! builder's job.

#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxKind {
    Function { name: String, params: Vec<String> },
    Block,

    Let { name: String },
    Var { name: String },
    Assign { name: String },
    Return,
    If,
    While,

    /// Children: `When*` then an optional `Otherwise`.
    Case,
    /// Children: `When*` then an optional `Otherwise`; clause actions are
    /// expressions instead of blocks.
    Match,
    When,
    Otherwise,

    Binary { operator: String },
    Unary { operator: String },
    Call { name: String },
    Closure { params: Vec<String> },

    Identifier { name: String },
    Integer { value: i64 },
    Float { value: f64 },
    Str { value: String },
    Bool { value: bool },
    Null,
}

impl SyntaxKind {
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            SyntaxKind::Match
                | SyntaxKind::Binary { .. }
                | SyntaxKind::Unary { .. }
                | SyntaxKind::Call { .. }
                | SyntaxKind::Closure { .. }
                | SyntaxKind::Identifier { .. }
                | SyntaxKind::Integer { .. }
                | SyntaxKind::Float { .. }
                | SyntaxKind::Str { .. }
                | SyntaxKind::Bool { .. }
                | SyntaxKind::Null
        )
    }
}

use std::fmt;

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxKind::Function { name, .. } => write!(f, "Function({})", name),
            SyntaxKind::Block => write!(f, "Block"),
            SyntaxKind::Let { name } => write!(f, "Let({})", name),
            SyntaxKind::Var { name } => write!(f, "Var({})", name),
            SyntaxKind::Assign { name } => write!(f, "Assign({})", name),
            SyntaxKind::Return => write!(f, "Return"),
            SyntaxKind::If => write!(f, "If"),
            SyntaxKind::While => write!(f, "While"),
            SyntaxKind::Case => write!(f, "Case"),
            SyntaxKind::Match => write!(f, "Match"),
            SyntaxKind::When => write!(f, "When"),
            SyntaxKind::Otherwise => write!(f, "Otherwise"),
            SyntaxKind::Binary { operator } => write!(f, "Binary({})", operator),
            SyntaxKind::Unary { operator } => write!(f, "Unary({})", operator),
            SyntaxKind::Call { name } => write!(f, "Call({})", name),
            SyntaxKind::Closure { params } => write!(f, "Closure({})", params.join(", ")),
            SyntaxKind::Identifier { name } => write!(f, "Identifier({})", name),
            SyntaxKind::Integer { value } => write!(f, "Integer({})", value),
            SyntaxKind::Float { value } => write!(f, "Float({})", value),
            SyntaxKind::Str { value } => write!(f, "Str({:?})", value),
            SyntaxKind::Bool { value } => write!(f, "Bool({})", value),
            SyntaxKind::Null => write!(f, "Null"),
        }
    }
}
