//! file: core/src/ir/case.rs
//! description: construction of case statements and match expressions.
//!
//! Both constructs are an ordered list of guarded clauses plus one mandatory
//! fallback. The builder records clauses as `when(condition)` followed by
//! `then(action)`, or both at once with `clause`, and `otherwise` sets the
//! fallback. Nothing touches the tree until `build`, which refuses to produce
//! a node with zero clauses, a clause without an action, or no fallback, and
//! leaves the tree untouched when it fails.
//!
use std::marker::PhantomData;

use crate::location::Origin;

use super::element::ElementId;
use super::err::{ConstructionError, MutationError};
use super::kind::{Arm, ElementKind, Role};
use super::tree::IrTree;

/// Which construct an `AlternativesBuilder` produces.
pub trait AlternativesKind {
    const ARM: Arm;
    const NAME: &'static str;
    fn assemble(clauses: Vec<ElementId>, otherwise: ElementId) -> ElementKind;
}

/// `case` statement: block actions, block fallback.
#[derive(Debug, Clone, Copy)]
pub struct Case;

/// `match` expression: value actions, value fallback.
#[derive(Debug, Clone, Copy)]
pub struct Match;

impl AlternativesKind for Case {
    const ARM: Arm = Arm::Statement;
    const NAME: &'static str = "CaseStatement";

    fn assemble(clauses: Vec<ElementId>, otherwise: ElementId) -> ElementKind {
        ElementKind::CaseStatement { clauses, otherwise }
    }
}

impl AlternativesKind for Match {
    const ARM: Arm = Arm::Value;
    const NAME: &'static str = "MatchExpression";

    fn assemble(clauses: Vec<ElementId>, otherwise: ElementId) -> ElementKind {
        ElementKind::MatchExpression { clauses, otherwise }
    }
}

#[derive(Debug, Clone)]
struct PendingClause {
    condition: ElementId,
    action: Option<ElementId>,
}

#[derive(Debug, Clone)]
pub struct AlternativesBuilder<K: AlternativesKind> {
    origin: Origin,
    clauses: Vec<PendingClause>,
    otherwise: Option<ElementId>,
    _kind: PhantomData<K>,
}

pub type CaseBuilder = AlternativesBuilder<Case>;
pub type MatchBuilder = AlternativesBuilder<Match>;

impl<K: AlternativesKind> AlternativesBuilder<K> {
    pub fn new(origin: Origin) -> Self {
        AlternativesBuilder {
            origin,
            clauses: Vec::new(),
            otherwise: None,
            _kind: PhantomData,
        }
    }

    /// Open a new clause guarded by `condition`.
    pub fn when(&mut self, condition: ElementId) -> &mut Self {
        self.clauses.push(PendingClause {
            condition,
            action: None,
        });
        self
    }

    /// Attach `action` to the most recently opened clause.
    pub fn then(&mut self, action: ElementId) -> Result<&mut Self, ConstructionError> {
        match self.clauses.last_mut() {
            Some(clause) if clause.action.is_none() => {
                clause.action = Some(action);
                Ok(self)
            }
            _ => Err(ConstructionError::NoPendingClause),
        }
    }

    /// Condition and action in one step.
    pub fn clause(&mut self, condition: ElementId, action: ElementId) -> &mut Self {
        self.clauses.push(PendingClause {
            condition,
            action: Some(action),
        });
        self
    }

    pub fn otherwise(&mut self, action: ElementId) -> Result<&mut Self, ConstructionError> {
        if self.otherwise.is_some() {
            return Err(ConstructionError::FallbackAlreadySet);
        }
        self.otherwise = Some(action);
        Ok(self)
    }

    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    pub fn has_fallback(&self) -> bool {
        self.otherwise.is_some()
    }

    /// Allocate the clauses and the construct itself.
    ///
    /// The protocol checks run first, then every condition, action and the
    /// fallback is checked against its slot and for a free owner. A failed
    /// build leaves the tree as it was: clauses allocated before a late
    /// failure are rolled back and their children released.
    pub fn build(self, tree: &mut IrTree) -> Result<ElementId, ConstructionError> {
        if self.clauses.is_empty() {
            return Err(ConstructionError::NoClauses);
        }
        let mut pairs = Vec::with_capacity(self.clauses.len());
        for (index, clause) in self.clauses.iter().enumerate() {
            match clause.action {
                Some(action) => pairs.push((clause.condition, action)),
                None => return Err(ConstructionError::ClauseWithoutAction { index }),
            }
        }
        let otherwise = self.otherwise.ok_or(ConstructionError::MissingFallback)?;

        // the assembled node with no clauses exposes only the fallback slot
        let mut adopted: Vec<(Role, ElementId)> = pairs
            .iter()
            .flat_map(|(condition, action)| [(Role::Expression, *condition), (K::ARM.action_role(), *action)])
            .collect();
        adopted.extend(K::assemble(Vec::new(), otherwise).slots());
        tree.check_adoption(K::NAME, &adopted, self.origin.location.as_ref())?;

        let mark = tree.len();
        match Self::allocate(tree, pairs, otherwise, &self.origin) {
            Ok(id) => {
                log::trace!("built {} {} with fallback {}", K::NAME, id, otherwise);
                Ok(id)
            }
            Err(error) => {
                tree.rollback(mark);
                Err(error.into())
            }
        }
    }

    fn allocate(
        tree: &mut IrTree,
        pairs: Vec<(ElementId, ElementId)>,
        otherwise: ElementId,
        origin: &Origin,
    ) -> Result<ElementId, MutationError> {
        let mut clause_ids = Vec::with_capacity(pairs.len());
        for (condition, action) in pairs {
            let clause_origin = tree
                .element(condition)
                .map(|e| e.origin().clone())
                .unwrap_or_else(|| origin.clone());
            let clause = tree.alloc(
                ElementKind::WhenClause {
                    condition,
                    action,
                    arm: K::ARM,
                },
                clause_origin,
            )?;
            clause_ids.push(clause);
        }
        tree.alloc(K::assemble(clause_ids, otherwise), origin.clone())
    }
}
