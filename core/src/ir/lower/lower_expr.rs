//! Lowering helpers for expression nodes.
//!
//! Operators are mapped from source text onto `BinaryOperator` /
//! `UnaryOperator`, literals onto `Constant`, and closures are lifted into
//! a `Function` held by the `ClosureReference` that creates them.

use crate::ir::case::Match;
use crate::ir::element::ElementId;
use crate::ir::kind::{BinaryOperator, ElementKind, UnaryOperator};
use crate::ir::value::Value;
use crate::syntax::{SyntaxKind, SyntaxNode, SyntaxVisitor};

use super::lower_stmt::{child, lower_alternatives};
use super::{BuildError, IrBuilder};

pub(crate) fn lower_expression(builder: &mut IrBuilder, node: &SyntaxNode) -> Result<ElementId, BuildError> {
    let issuer = "trellis.ir.lower.lower_expression";
    match node.get_kind() {
        SyntaxKind::Binary { operator } => {
            let operator = BinaryOperator::from_symbol(operator).ok_or_else(|| {
                BuildError::malformed(node, format!("Unknown binary operator '{}'.", operator), issuer)
            })?;
            let left = builder.visit_node(child(node, 0, issuer)?)?;
            let right = builder.visit_node(child(node, 1, issuer)?)?;
            builder.alloc(
                ElementKind::BinaryOperation {
                    operator,
                    left,
                    right,
                },
                node,
            )
        }
        SyntaxKind::Unary { operator } => {
            let operator = UnaryOperator::from_symbol(operator).ok_or_else(|| {
                BuildError::malformed(node, format!("Unknown unary operator '{}'.", operator), issuer)
            })?;
            let operand = builder.visit_node(child(node, 0, issuer)?)?;
            builder.alloc(ElementKind::UnaryOperation { operator, operand }, node)
        }
        SyntaxKind::Call { name } => {
            let mut arguments = Vec::with_capacity(node.children.len());
            for arg in &node.children {
                arguments.push(builder.visit_node(arg)?);
            }
            builder.alloc(
                ElementKind::FunctionInvocation {
                    name: name.clone(),
                    arguments,
                    target: None,
                },
                node,
            )
        }
        SyntaxKind::Closure { params } => {
            let body = child(node, 0, issuer)?;
            let name = builder.ctx.next_closure_name();
            let function = builder.lower_function(&name, params, body, true, node.origin())?;
            builder.alloc(
                ElementKind::ClosureReference {
                    function,
                    captured: Vec::new(),
                },
                node,
            )
        }
        SyntaxKind::Match => lower_alternatives::<Match>(builder, node, "Match expression", lower_value),
        SyntaxKind::Identifier { name } => builder.alloc(
            ElementKind::LocalReference {
                name: name.clone(),
                binding: None,
            },
            node,
        ),
        SyntaxKind::Integer { value } => constant(builder, node, Value::Int(*value)),
        SyntaxKind::Float { value } => constant(builder, node, Value::Float(*value)),
        SyntaxKind::Str { value } => constant(builder, node, Value::Str(value.clone())),
        SyntaxKind::Bool { value } => constant(builder, node, Value::Bool(*value)),
        SyntaxKind::Null => constant(builder, node, Value::Null),
        other => Err(BuildError::malformed(
            node,
            format!("Expected an expression, found {}.", other),
            issuer,
        )),
    }
}

fn lower_value(builder: &mut IrBuilder, node: &SyntaxNode) -> Result<ElementId, BuildError> {
    builder.visit_node(node)
}

fn constant(builder: &mut IrBuilder, node: &SyntaxNode, value: Value) -> Result<ElementId, BuildError> {
    builder.alloc(ElementKind::Constant { value }, node)
}
