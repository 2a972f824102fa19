use crate::error::{Level, TrellisErrorExt};
use crate::location::{Location, Span};

use super::element::{ElementId, TreeId};
use super::kind::Role;

/// Contract violation raised by the tree mutation API. A failed operation
/// leaves the tree exactly as it was.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationError {
    /// A handle that does not belong to this tree.
    UnknownElement { tree: TreeId, element: ElementId },
    /// The element cannot fill the role of the slot it was offered for.
    TypeMismatch {
        tree: TreeId,
        owner: ElementId,
        owner_kind: &'static str,
        expected: Vec<Role>,
        found: &'static str,
        location: Option<Location>,
    },
    /// `original` is not currently held by `owner` (stale or detached).
    NotAChild {
        tree: TreeId,
        owner: ElementId,
        owner_kind: &'static str,
        child: ElementId,
        location: Option<Location>,
    },
    /// The element is still held in another owner's slot.
    StillOwned {
        tree: TreeId,
        element: ElementId,
        holder: ElementId,
    },
    /// The same element was offered for two slots of one owner.
    DuplicateChild { tree: TreeId, element: ElementId },
    /// The element is the tree root, the owner itself or one of its ancestors.
    Cycle {
        tree: TreeId,
        owner: ElementId,
        element: ElementId,
    },
    /// An annotation was written onto an element of the wrong kind.
    InvalidAnnotation {
        tree: TreeId,
        element: ElementId,
        annotation: &'static str,
        found: &'static str,
    },
    /// A child's parent back-reference disagrees with the owner holding it.
    BrokenParentLink {
        tree: TreeId,
        element: ElementId,
        expected: ElementId,
        found: Option<ElementId>,
    },
}

impl MutationError {
    pub fn tree(&self) -> TreeId {
        match self {
            MutationError::UnknownElement { tree, .. }
            | MutationError::TypeMismatch { tree, .. }
            | MutationError::NotAChild { tree, .. }
            | MutationError::StillOwned { tree, .. }
            | MutationError::DuplicateChild { tree, .. }
            | MutationError::Cycle { tree, .. }
            | MutationError::InvalidAnnotation { tree, .. }
            | MutationError::BrokenParentLink { tree, .. } => *tree,
        }
    }
}

impl std::fmt::Display for MutationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationError::UnknownElement { tree, element } => {
                write!(f, "Element {} does not belong to tree {}.", element, tree)
            }
            MutationError::TypeMismatch {
                tree,
                owner,
                owner_kind,
                expected,
                found,
                ..
            } => {
                let expected = expected
                    .iter()
                    .map(|r| r.to_string())
                    .collect::<Vec<_>>()
                    .join(" or ");
                write!(
                    f,
                    "Type mismatch in {} {} (tree {}): expected {}, found {}.",
                    owner_kind, owner, tree, expected, found
                )
            }
            MutationError::NotAChild {
                tree,
                owner,
                owner_kind,
                child,
                ..
            } => write!(
                f,
                "Element {} is not a child of {} {} (tree {}).",
                child, owner_kind, owner, tree
            ),
            MutationError::StillOwned {
                tree,
                element,
                holder,
            } => write!(
                f,
                "Element {} is still held by {} (tree {}); release it before attaching it elsewhere.",
                element, holder, tree
            ),
            MutationError::DuplicateChild { tree, element } => write!(
                f,
                "Element {} was given twice to the same owner (tree {}).",
                element, tree
            ),
            MutationError::Cycle {
                tree,
                owner,
                element,
            } => write!(
                f,
                "Attaching {} under {} would make the tree cyclic (tree {}).",
                element, owner, tree
            ),
            MutationError::InvalidAnnotation {
                tree,
                element,
                annotation,
                found,
            } => write!(
                f,
                "Cannot attach {} to {} {} (tree {}).",
                annotation, found, element, tree
            ),
            MutationError::BrokenParentLink {
                tree,
                element,
                expected,
                found,
            } => match found {
                Some(found) => write!(
                    f,
                    "Element {} is held by {} but records {} as its parent (tree {}).",
                    element, expected, found, tree
                ),
                None => write!(
                    f,
                    "Element {} is held by {} but records no parent (tree {}).",
                    element, expected, tree
                ),
            },
        }
    }
}

impl std::error::Error for MutationError {}

impl TrellisErrorExt for MutationError {
    fn level(&self) -> Level {
        Level::Critical
    }

    fn message(&self) -> String {
        self.to_string()
    }

    fn issuer(&self) -> String {
        match self {
            MutationError::InvalidAnnotation { .. } => "trellis.ir.annotate".to_string(),
            MutationError::DuplicateChild { .. } => "trellis.ir.alloc".to_string(),
            MutationError::BrokenParentLink { .. } => "trellis.ir.validate".to_string(),
            _ => "trellis.ir.replace_element".to_string(),
        }
    }

    fn span(&self) -> Option<Span> {
        None
    }

    fn location(&self) -> Option<Location> {
        match self {
            MutationError::TypeMismatch { location, .. }
            | MutationError::NotAChild { location, .. } => location.clone(),
            _ => None,
        }
    }
}

/// Misuse of the case/match construction protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstructionError {
    /// `then` with no clause waiting for an action.
    NoPendingClause,
    /// A clause never received its action.
    ClauseWithoutAction { index: usize },
    /// The fallback was never set.
    MissingFallback,
    /// The fallback was set a second time.
    FallbackAlreadySet,
    /// A construct with zero guarded clauses.
    NoClauses,
    /// Allocation of the finished node was rejected by the tree.
    Mutation(MutationError),
}

impl From<MutationError> for ConstructionError {
    fn from(error: MutationError) -> Self {
        ConstructionError::Mutation(error)
    }
}

impl std::fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstructionError::NoPendingClause => {
                write!(f, "Clause action set with no pending clause; add the condition first.")
            }
            ConstructionError::ClauseWithoutAction { index } => {
                write!(f, "Clause {} has a condition but no action.", index)
            }
            ConstructionError::MissingFallback => {
                write!(f, "Fallback (otherwise) branch is required but was never set.")
            }
            ConstructionError::FallbackAlreadySet => {
                write!(f, "Fallback (otherwise) branch was already set.")
            }
            ConstructionError::NoClauses => write!(f, "At least one guarded clause is required."),
            ConstructionError::Mutation(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ConstructionError {}

impl TrellisErrorExt for ConstructionError {
    fn level(&self) -> Level {
        Level::Critical
    }

    fn message(&self) -> String {
        self.to_string()
    }

    fn issuer(&self) -> String {
        match self {
            ConstructionError::Mutation(e) => e.issuer(),
            _ => "trellis.ir.case_builder".to_string(),
        }
    }

    fn span(&self) -> Option<Span> {
        None
    }

    fn location(&self) -> Option<Location> {
        match self {
            ConstructionError::Mutation(e) => e.location(),
            _ => None,
        }
    }
}
