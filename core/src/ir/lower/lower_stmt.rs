//! Lowering helpers for statement nodes.
//!
//! Blocks, declarations and assignments, control flow and `case`. A
//! `let x = match ...` (or `var`) statement is split into a declaration
//! holding `null` followed by an initializing `x = match ...`, so the match
//! can later be expanded into assignments in each arm. The declaration keeps
//! its `let`, so only the initializer may write it.

use crate::ir::case::{AlternativesBuilder, AlternativesKind, Case};
use crate::ir::element::ElementId;
use crate::ir::kind::{Declaration, ElementKind};
use crate::ir::value::Value;
use crate::syntax::{SyntaxKind, SyntaxNode, SyntaxVisitor};

use super::{BuildError, IrBuilder};

pub(crate) fn child<'a>(node: &'a SyntaxNode, index: usize, issuer: &str) -> Result<&'a SyntaxNode, BuildError> {
    node.children.get(index).ok_or_else(|| {
        BuildError::malformed(
            node,
            format!("{} is missing child {}.", node.get_kind(), index),
            issuer,
        )
    })
}

pub(crate) fn lower_block(builder: &mut IrBuilder, node: &SyntaxNode) -> Result<ElementId, BuildError> {
    let issuer = "trellis.ir.lower.lower_block";
    if *node.get_kind() != SyntaxKind::Block {
        return Err(BuildError::malformed(
            node,
            format!("Expected a block, found {}.", node.get_kind()),
            issuer,
        ));
    }

    let mut statements = Vec::with_capacity(node.children.len());
    for stmt in &node.children {
        if let SyntaxKind::Let { name } | SyntaxKind::Var { name } = stmt.get_kind() {
            let value = child(stmt, 0, issuer)?;
            if *value.get_kind() == SyntaxKind::Match {
                let declaration = match stmt.get_kind() {
                    SyntaxKind::Let { .. } => Declaration::Let,
                    _ => Declaration::Var,
                };
                let null = builder.alloc(ElementKind::Constant { value: Value::Null }, stmt)?;
                let declare = builder.alloc(
                    ElementKind::AssignmentStatement {
                        name: name.clone(),
                        declaration: Some(declaration),
                        value: null,
                        binding: None,
                        initializer: false,
                    },
                    stmt,
                )?;
                let value = builder.visit_node(value)?;
                let assign = builder.alloc(
                    ElementKind::AssignmentStatement {
                        name: name.clone(),
                        declaration: None,
                        value,
                        binding: None,
                        initializer: true,
                    },
                    stmt,
                )?;
                statements.push(declare);
                statements.push(assign);
                continue;
            }
        }
        statements.push(builder.visit_node(stmt)?);
    }
    builder.alloc(ElementKind::Block { statements }, node)
}

pub(crate) fn lower_statement(builder: &mut IrBuilder, node: &SyntaxNode) -> Result<ElementId, BuildError> {
    let issuer = "trellis.ir.lower.lower_statement";
    match node.get_kind() {
        SyntaxKind::Block => lower_block(builder, node),
        SyntaxKind::Let { name } | SyntaxKind::Var { name } | SyntaxKind::Assign { name } => {
            let declaration = match node.get_kind() {
                SyntaxKind::Let { .. } => Some(Declaration::Let),
                SyntaxKind::Var { .. } => Some(Declaration::Var),
                _ => None,
            };
            let value = builder.visit_node(child(node, 0, issuer)?)?;
            builder.alloc(
                ElementKind::AssignmentStatement {
                    name: name.clone(),
                    declaration,
                    value,
                    binding: None,
                    initializer: false,
                },
                node,
            )
        }
        SyntaxKind::Return => {
            let value = match node.children.first() {
                Some(expr) => Some(builder.visit_node(expr)?),
                None => None,
            };
            builder.alloc(ElementKind::ReturnStatement { value }, node)
        }
        SyntaxKind::If => {
            let condition = builder.visit_node(child(node, 0, issuer)?)?;
            let then_block = lower_block(builder, child(node, 1, issuer)?)?;
            let else_branch = match node.children.get(2) {
                Some(branch) if *branch.get_kind() == SyntaxKind::If => Some(lower_statement(builder, branch)?),
                Some(branch) => Some(lower_block(builder, branch)?),
                None => None,
            };
            builder.alloc(
                ElementKind::ConditionalBranching {
                    condition,
                    then_block,
                    else_branch,
                },
                node,
            )
        }
        SyntaxKind::While => {
            let condition = builder.visit_node(child(node, 0, issuer)?)?;
            let body = lower_block(builder, child(node, 1, issuer)?)?;
            builder.alloc(ElementKind::LoopStatement { condition, body }, node)
        }
        SyntaxKind::Case => lower_alternatives::<Case>(builder, node, "Case statement", lower_block),
        SyntaxKind::Function { name, .. } => Err(BuildError::malformed(
            node,
            format!("Function '{}' declared inside a block; use a closure instead.", name),
            issuer,
        )),
        SyntaxKind::When | SyntaxKind::Otherwise => Err(BuildError::malformed(
            node,
            format!("'{}' clause outside of a case or match.", node.get_kind()),
            issuer,
        )),
        _ => super::lower_expr::lower_expression(builder, node),
    }
}

/// Lower a `case` or `match` node: `When` children in order, then exactly
/// one `Otherwise`.
pub(crate) fn lower_alternatives<K: AlternativesKind>(
    builder: &mut IrBuilder,
    node: &SyntaxNode,
    what: &str,
    lower_action: fn(&mut IrBuilder, &SyntaxNode) -> Result<ElementId, BuildError>,
) -> Result<ElementId, BuildError> {
    let issuer = "trellis.ir.lower.lower_alternatives";
    let mut alternatives = AlternativesBuilder::<K>::new(node.origin());
    for clause in &node.children {
        match clause.get_kind() {
            SyntaxKind::When => {
                let condition = builder.visit_node(child(clause, 0, issuer)?)?;
                let action = lower_action(builder, child(clause, 1, issuer)?)?;
                alternatives.when(condition).then(action)?;
            }
            SyntaxKind::Otherwise => {
                let action = lower_action(builder, child(clause, 0, issuer)?)?;
                alternatives.otherwise(action).map_err(|e| {
                    BuildError::malformed(clause, format!("{}: {}", what, e), issuer)
                })?;
            }
            other => {
                return Err(BuildError::malformed(
                    clause,
                    format!("{} cannot contain {}.", what, other),
                    issuer,
                ));
            }
        }
    }

    if alternatives.clause_count() == 0 {
        return Err(BuildError::malformed(
            node,
            format!("{} has no 'when' clauses.", what),
            issuer,
        ));
    }
    if !alternatives.has_fallback() {
        return Err(BuildError::malformed(
            node,
            format!("{} has no 'otherwise' branch.", what),
            issuer,
        ));
    }
    Ok(alternatives.build(builder.tree_mut())?)
}
