//! file: core/src/ir/kind.rs
//! description: IR element kinds, structural roles and annotations.
//!
//! `ElementKind` is the closed set of IR node kinds. Composite kinds hold the
//! `ElementId`s of their children; `slots` lists those children with the
//! `Role` each position demands, in traversal order. Everything that reads or
//! rewrites children (allocation, replacement, walking, validation) goes
//! through `slots`/`slots_mut`, so a kind's structure is described once.
//!
use serde::{Deserialize, Serialize};

use super::element::ElementId;
use super::value::Value;

/// Binary operators of the IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add, // +
    Sub, // -
    Mul, // *
    Div, // /
    Mod, // %
    Eq,  // ==
    Ne,  // !=
    Lt,  // <
    Le,  // <=
    Gt,  // >
    Ge,  // >=
    And, // and
    Or,  // or
}

impl BinaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Sub,
            "*" => BinaryOperator::Mul,
            "/" => BinaryOperator::Div,
            "%" => BinaryOperator::Mod,
            "==" => BinaryOperator::Eq,
            "!=" => BinaryOperator::Ne,
            "<" => BinaryOperator::Lt,
            "<=" => BinaryOperator::Le,
            ">" => BinaryOperator::Gt,
            ">=" => BinaryOperator::Ge,
            "and" => BinaryOperator::And,
            "or" => BinaryOperator::Or,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Neg, // -
    Not, // not
}

impl UnaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "-" => Some(UnaryOperator::Neg),
            "not" => Some(UnaryOperator::Not),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Neg => "-",
            UnaryOperator::Not => "not",
        }
    }
}

/// How an assignment introduces its target, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Declaration {
    /// `let`: constant after initialisation.
    Let,
    /// `var`: reassignable.
    Var,
}

/// What a guarded clause's action is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arm {
    /// A block, as in `case`.
    Statement,
    /// A value expression, as in `match`.
    Value,
}

impl Arm {
    pub fn action_role(&self) -> Role {
        match self {
            Arm::Statement => Role::Block,
            Arm::Value => Role::Expression,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingKind {
    Captured,
    Parameter,
    Local,
}

/// Frame slot a name resolved to. Captures come first, then parameters, then
/// locals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Binding {
    pub slot: u16,
    pub kind: BindingKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallTarget {
    /// A function declared in the module.
    Module,
    /// A runtime-provided function.
    Builtin,
    /// A closure held in a local slot.
    Local(Binding),
}

/// Structural role of a child position. `accepts` is the capability check
/// used on allocation and replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Function,
    Block,
    Statement,
    Expression,
    Clause(Arm),
    ElseBranch,
}

impl Role {
    pub fn accepts(&self, kind: &ElementKind) -> bool {
        match self {
            Role::Function => matches!(kind, ElementKind::Function { .. }),
            Role::Block => matches!(kind, ElementKind::Block { .. }),
            Role::Statement => kind.is_statement() || kind.is_expression(),
            Role::Expression => kind.is_expression(),
            Role::Clause(arm) => {
                matches!(kind, ElementKind::WhenClause { arm: clause_arm, .. } if clause_arm == arm)
            }
            Role::ElseBranch => matches!(
                kind,
                ElementKind::Block { .. } | ElementKind::ConditionalBranching { .. }
            ),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Function => write!(f, "Function"),
            Role::Block => write!(f, "Block"),
            Role::Statement => write!(f, "Statement"),
            Role::Expression => write!(f, "Expression"),
            Role::Clause(Arm::Statement) => write!(f, "WhenClause (block action)"),
            Role::Clause(Arm::Value) => write!(f, "WhenClause (value action)"),
            Role::ElseBranch => write!(f, "Block or ConditionalBranching"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Module {
        name: String,
        functions: Vec<ElementId>,
    },
    Function {
        name: String,
        params: Vec<String>,
        body: ElementId,
        closure: bool,
        /// Names captured from enclosing scopes, filled by closure capture.
        captures: Vec<String>,
    },
    Block {
        statements: Vec<ElementId>,
    },
    CaseStatement {
        clauses: Vec<ElementId>,
        otherwise: ElementId,
    },
    WhenClause {
        condition: ElementId,
        action: ElementId,
        arm: Arm,
    },
    ConditionalBranching {
        condition: ElementId,
        then_block: ElementId,
        else_branch: Option<ElementId>,
    },
    LoopStatement {
        condition: ElementId,
        body: ElementId,
    },
    AssignmentStatement {
        name: String,
        declaration: Option<Declaration>,
        value: ElementId,
        binding: Option<Binding>,
        /// Gives a declared-but-deferred name its first value; allowed to
        /// write a `let` once.
        initializer: bool,
    },
    ReturnStatement {
        value: Option<ElementId>,
    },

    Constant {
        value: Value,
    },
    LocalReference {
        name: String,
        binding: Option<Binding>,
    },
    BinaryOperation {
        operator: BinaryOperator,
        left: ElementId,
        right: ElementId,
    },
    UnaryOperation {
        operator: UnaryOperator,
        operand: ElementId,
    },
    FunctionInvocation {
        name: String,
        arguments: Vec<ElementId>,
        target: Option<CallTarget>,
    },
    ClosureReference {
        function: ElementId,
        /// Enclosing-frame bindings of the function's captures, in order.
        captured: Vec<Binding>,
    },
    MatchExpression {
        clauses: Vec<ElementId>,
        otherwise: ElementId,
    },
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Module { .. } => "Module",
            ElementKind::Function { .. } => "Function",
            ElementKind::Block { .. } => "Block",
            ElementKind::CaseStatement { .. } => "CaseStatement",
            ElementKind::WhenClause { .. } => "WhenClause",
            ElementKind::ConditionalBranching { .. } => "ConditionalBranching",
            ElementKind::LoopStatement { .. } => "LoopStatement",
            ElementKind::AssignmentStatement { .. } => "AssignmentStatement",
            ElementKind::ReturnStatement { .. } => "ReturnStatement",
            ElementKind::Constant { .. } => "Constant",
            ElementKind::LocalReference { .. } => "LocalReference",
            ElementKind::BinaryOperation { .. } => "BinaryOperation",
            ElementKind::UnaryOperation { .. } => "UnaryOperation",
            ElementKind::FunctionInvocation { .. } => "FunctionInvocation",
            ElementKind::ClosureReference { .. } => "ClosureReference",
            ElementKind::MatchExpression { .. } => "MatchExpression",
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            ElementKind::Block { .. }
                | ElementKind::CaseStatement { .. }
                | ElementKind::ConditionalBranching { .. }
                | ElementKind::LoopStatement { .. }
                | ElementKind::AssignmentStatement { .. }
                | ElementKind::ReturnStatement { .. }
        )
    }

    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            ElementKind::Constant { .. }
                | ElementKind::LocalReference { .. }
                | ElementKind::BinaryOperation { .. }
                | ElementKind::UnaryOperation { .. }
                | ElementKind::FunctionInvocation { .. }
                | ElementKind::ClosureReference { .. }
                | ElementKind::MatchExpression { .. }
        )
    }

    /// Children with the role of the position they occupy, in walk order.
    pub fn slots(&self) -> Vec<(Role, ElementId)> {
        match self {
            ElementKind::Module { functions, .. } => {
                functions.iter().map(|f| (Role::Function, *f)).collect()
            }
            ElementKind::Function { body, .. } => vec![(Role::Block, *body)],
            ElementKind::Block { statements } => {
                statements.iter().map(|s| (Role::Statement, *s)).collect()
            }
            ElementKind::CaseStatement { clauses, otherwise } => {
                let mut slots: Vec<_> = clauses
                    .iter()
                    .map(|c| (Role::Clause(Arm::Statement), *c))
                    .collect();
                slots.push((Role::Block, *otherwise));
                slots
            }
            ElementKind::MatchExpression { clauses, otherwise } => {
                let mut slots: Vec<_> = clauses
                    .iter()
                    .map(|c| (Role::Clause(Arm::Value), *c))
                    .collect();
                slots.push((Role::Expression, *otherwise));
                slots
            }
            ElementKind::WhenClause {
                condition,
                action,
                arm,
            } => vec![(Role::Expression, *condition), (arm.action_role(), *action)],
            ElementKind::ConditionalBranching {
                condition,
                then_block,
                else_branch,
            } => {
                let mut slots = vec![(Role::Expression, *condition), (Role::Block, *then_block)];
                if let Some(branch) = else_branch {
                    slots.push((Role::ElseBranch, *branch));
                }
                slots
            }
            ElementKind::LoopStatement { condition, body } => {
                vec![(Role::Expression, *condition), (Role::Block, *body)]
            }
            ElementKind::AssignmentStatement { value, .. } => vec![(Role::Expression, *value)],
            ElementKind::ReturnStatement { value } => {
                value.iter().map(|v| (Role::Expression, *v)).collect()
            }
            ElementKind::BinaryOperation { left, right, .. } => {
                vec![(Role::Expression, *left), (Role::Expression, *right)]
            }
            ElementKind::UnaryOperation { operand, .. } => vec![(Role::Expression, *operand)],
            ElementKind::FunctionInvocation { arguments, .. } => {
                arguments.iter().map(|a| (Role::Expression, *a)).collect()
            }
            ElementKind::ClosureReference { function, .. } => vec![(Role::Function, *function)],
            ElementKind::Constant { .. } | ElementKind::LocalReference { .. } => Vec::new(),
        }
    }

    /// Mutable view of the child positions, same order as `slots`.
    pub(crate) fn slots_mut(&mut self) -> Vec<(Role, &mut ElementId)> {
        match self {
            ElementKind::Module { functions, .. } => {
                functions.iter_mut().map(|f| (Role::Function, f)).collect()
            }
            ElementKind::Function { body, .. } => vec![(Role::Block, body)],
            ElementKind::Block { statements } => {
                statements.iter_mut().map(|s| (Role::Statement, s)).collect()
            }
            ElementKind::CaseStatement { clauses, otherwise } => {
                let mut slots: Vec<_> = clauses
                    .iter_mut()
                    .map(|c| (Role::Clause(Arm::Statement), c))
                    .collect();
                slots.push((Role::Block, otherwise));
                slots
            }
            ElementKind::MatchExpression { clauses, otherwise } => {
                let mut slots: Vec<_> = clauses
                    .iter_mut()
                    .map(|c| (Role::Clause(Arm::Value), c))
                    .collect();
                slots.push((Role::Expression, otherwise));
                slots
            }
            ElementKind::WhenClause {
                condition,
                action,
                arm,
            } => {
                let action_role = arm.action_role();
                vec![(Role::Expression, condition), (action_role, action)]
            }
            ElementKind::ConditionalBranching {
                condition,
                then_block,
                else_branch,
            } => {
                let mut slots = vec![(Role::Expression, condition), (Role::Block, then_block)];
                if let Some(branch) = else_branch {
                    slots.push((Role::ElseBranch, branch));
                }
                slots
            }
            ElementKind::LoopStatement { condition, body } => {
                vec![(Role::Expression, condition), (Role::Block, body)]
            }
            ElementKind::AssignmentStatement { value, .. } => vec![(Role::Expression, value)],
            ElementKind::ReturnStatement { value } => {
                value.iter_mut().map(|v| (Role::Expression, v)).collect()
            }
            ElementKind::BinaryOperation { left, right, .. } => {
                vec![(Role::Expression, left), (Role::Expression, right)]
            }
            ElementKind::UnaryOperation { operand, .. } => vec![(Role::Expression, operand)],
            ElementKind::FunctionInvocation { arguments, .. } => {
                arguments.iter_mut().map(|a| (Role::Expression, a)).collect()
            }
            ElementKind::ClosureReference { function, .. } => vec![(Role::Function, function)],
            ElementKind::Constant { .. } | ElementKind::LocalReference { .. } => Vec::new(),
        }
    }

    /// Distinct roles this kind has child positions for.
    pub fn accepted_roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = Vec::new();
        for (role, _) in self.slots() {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        roles
    }

    pub fn children(&self) -> Vec<ElementId> {
        self.slots().into_iter().map(|(_, id)| id).collect()
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementKind::Module { name, .. } => write!(f, "Module {}", name),
            ElementKind::Function {
                name,
                params,
                closure,
                captures,
                ..
            } => {
                let tag = if *closure { "Closure" } else { "Function" };
                write!(f, "{} {}|{}|", tag, name, params.join(", "))?;
                if !captures.is_empty() {
                    write!(f, " captures [{}]", captures.join(", "))?;
                }
                Ok(())
            }
            ElementKind::AssignmentStatement {
                name,
                declaration,
                binding,
                initializer,
                ..
            } => {
                let prefix = match (declaration, initializer) {
                    (Some(Declaration::Let), _) => "let ",
                    (Some(Declaration::Var), _) => "var ",
                    (None, true) => "init ",
                    (None, false) => "",
                };
                write!(f, "AssignmentStatement {}{}", prefix, name)?;
                if let Some(b) = binding {
                    write!(f, " -> slot {}", b.slot)?;
                }
                Ok(())
            }
            ElementKind::Constant { value } => write!(f, "Constant {}", value),
            ElementKind::LocalReference { name, binding } => {
                write!(f, "LocalReference {}", name)?;
                if let Some(b) = binding {
                    write!(f, " -> slot {}", b.slot)?;
                }
                Ok(())
            }
            ElementKind::BinaryOperation { operator, .. } => {
                write!(f, "BinaryOperation {}", operator.symbol())
            }
            ElementKind::UnaryOperation { operator, .. } => {
                write!(f, "UnaryOperation {}", operator.symbol())
            }
            ElementKind::FunctionInvocation { name, arguments, .. } => {
                write!(f, "FunctionInvocation {}/{}", name, arguments.len())
            }
            other => write!(f, "{}", other.name()),
        }
    }
}
