//! file: core/src/passes/desugar.rs
//! description: match and case expansion.
//!
//! `MatchExpansion` turns a match in statement position (`x = match ...`,
//! `return match ...`) into a case statement whose clause actions assign or
//! return the clause value. `CaseExpansion` turns every case statement into
//! a chain of conditionals ending in the fallback block.
//!
//! Both move the existing guards and actions into the new structure with
//! `release` + `alloc` and then swap the new node in with
//! `replace_element`, so every moved element keeps its identity and origin.

use crate::ir::{Arm, ElementId, ElementKind, IrRewriter, IrTree, MutationError};
use crate::location::Origin;

use super::{Pass, release};

/// How an expanded clause value is turned back into a statement.
#[derive(Debug, Clone)]
enum Sink {
    Assign { name: String, initializer: bool },
    Return,
}

#[derive(Debug, Default)]
pub struct MatchExpansion {
    expanded: usize,
}

impl MatchExpansion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expanded(&self) -> usize {
        self.expanded
    }

    fn sink_statement(tree: &mut IrTree, sink: &Sink, value: ElementId) -> Result<ElementId, MutationError> {
        let origin = tree.get(value)?.origin().clone();
        let statement = match sink {
            Sink::Assign { name, initializer } => ElementKind::AssignmentStatement {
                name: name.clone(),
                declaration: None,
                value,
                binding: None,
                initializer: *initializer,
            },
            Sink::Return => ElementKind::ReturnStatement { value: Some(value) },
        };
        let statement = tree.alloc(statement, origin.clone())?;
        tree.alloc(
            ElementKind::Block {
                statements: vec![statement],
            },
            origin,
        )
    }

    /// Build the case statement for `match_id`, emptying the match.
    fn expand(&mut self, tree: &mut IrTree, match_id: ElementId, sink: &Sink) -> Result<ElementId, MutationError> {
        let (clauses, otherwise) = match tree.alternatives(match_id) {
            Some((clauses, otherwise)) => (clauses.to_vec(), otherwise),
            None => return Ok(match_id),
        };
        let origin = tree.get(match_id)?.origin().clone();

        let mut case_clauses = Vec::with_capacity(clauses.len());
        for clause in clauses {
            let Some((condition, value)) = tree.when_parts(clause) else {
                continue;
            };
            let clause_origin = tree.get(clause)?.origin().clone();
            let condition = release(tree, clause, condition)?;
            let value = release(tree, clause, value)?;
            let action = Self::sink_statement(tree, sink, value)?;
            case_clauses.push(tree.alloc(
                ElementKind::WhenClause {
                    condition,
                    action,
                    arm: Arm::Statement,
                },
                clause_origin,
            )?);
        }
        let fallback = release(tree, match_id, otherwise)?;
        let fallback = Self::sink_statement(tree, sink, fallback)?;

        self.expanded += 1;
        tree.alloc(
            ElementKind::CaseStatement {
                clauses: case_clauses,
                otherwise: fallback,
            },
            origin,
        )
    }

    /// Replace `statement` with the expansion of its match, then visit the
    /// new case so matches nested in its arms are expanded too.
    fn expand_statement(
        &mut self,
        tree: &mut IrTree,
        statement: ElementId,
        match_id: ElementId,
        sink: Sink,
    ) -> Result<(), MutationError> {
        let Some(owner) = tree.parent(statement) else {
            log::warn!("match {} sits in detached statement {}; left unexpanded", match_id, statement);
            return tree.walk_mut(statement, self);
        };
        let case = self.expand(tree, match_id, &sink)?;
        tree.replace_element(owner, statement, case)?;
        log::trace!("expanded match {} into case {}", match_id, case);
        tree.accept_mut(case, self)
    }
}

fn statement_match(tree: &IrTree, value: Option<ElementId>) -> Option<ElementId> {
    let value = value?;
    match tree.kind(value)? {
        ElementKind::MatchExpression { .. } => Some(value),
        _ => None,
    }
}

impl IrRewriter for MatchExpansion {
    fn visit_assignment_statement(&mut self, tree: &mut IrTree, id: ElementId) -> Result<(), MutationError> {
        let (name, value, initializer) = match tree.kind(id) {
            Some(ElementKind::AssignmentStatement {
                name,
                declaration: None,
                value,
                initializer,
                ..
            }) => (name.clone(), *value, *initializer),
            _ => return tree.walk_mut(id, self),
        };
        match statement_match(tree, Some(value)) {
            Some(match_id) => self.expand_statement(tree, id, match_id, Sink::Assign { name, initializer }),
            None => tree.walk_mut(id, self),
        }
    }

    fn visit_return_statement(&mut self, tree: &mut IrTree, id: ElementId) -> Result<(), MutationError> {
        let value = match tree.kind(id) {
            Some(ElementKind::ReturnStatement { value }) => *value,
            _ => None,
        };
        match statement_match(tree, value) {
            Some(match_id) => self.expand_statement(tree, id, match_id, Sink::Return),
            None => tree.walk_mut(id, self),
        }
    }
}

impl Pass for MatchExpansion {
    fn name(&self) -> &'static str {
        "match-expansion"
    }

    fn run(&mut self, tree: &mut IrTree) -> Result<(), MutationError> {
        self.expanded = 0;
        tree.traverse_mut(self)
    }
}

#[derive(Debug, Default)]
pub struct CaseExpansion {
    expanded: usize,
}

impl CaseExpansion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expanded(&self) -> usize {
        self.expanded
    }
}

impl IrRewriter for CaseExpansion {
    fn visit_case_statement(&mut self, tree: &mut IrTree, id: ElementId) -> Result<(), MutationError> {
        // innermost cases first
        tree.walk_mut(id, self)?;

        let Some(owner) = tree.parent(id) else {
            return Ok(());
        };
        let (clauses, otherwise) = match tree.alternatives(id) {
            Some((clauses, otherwise)) => (clauses.to_vec(), otherwise),
            None => return Ok(()),
        };

        let mut chain = release(tree, id, otherwise)?;
        for clause in clauses.into_iter().rev() {
            let Some((condition, action)) = tree.when_parts(clause) else {
                continue;
            };
            let origin: Origin = tree.get(clause)?.origin().clone();
            let condition = release(tree, clause, condition)?;
            let action = release(tree, clause, action)?;
            chain = tree.alloc(
                ElementKind::ConditionalBranching {
                    condition,
                    then_block: action,
                    else_branch: Some(chain),
                },
                origin,
            )?;
        }

        tree.replace_element(owner, id, chain)?;
        self.expanded += 1;
        log::trace!("expanded case {} into conditional {}", id, chain);
        Ok(())
    }
}

impl Pass for CaseExpansion {
    fn name(&self) -> &'static str {
        "case-expansion"
    }

    fn run(&mut self, tree: &mut IrTree) -> Result<(), MutationError> {
        self.expanded = 0;
        tree.traverse_mut(self)
    }
}
