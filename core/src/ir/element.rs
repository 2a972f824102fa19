use uuid::Uuid;

use crate::location::{Location, Origin, Span};

use super::kind::ElementKind;

/// Handle to an element stored in an `IrTree` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) u32);

impl ElementId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of one IR tree. Two compilation units never share a tree, so the
/// id is what error reports use to say which tree a stale handle came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeId(Uuid);

impl TreeId {
    pub fn new() -> Self {
        TreeId(Uuid::new_v4())
    }
}

impl Default for TreeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TreeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// One tree participant: its kind (which owns the handles of its children),
/// the handle of its current parent, and the source position it was built
/// from.
#[derive(Debug, Clone)]
pub struct IrElement {
    pub(crate) kind: ElementKind,
    pub(crate) parent: Option<ElementId>,
    pub(crate) origin: Origin,
}

impl IrElement {
    pub(crate) fn new(kind: ElementKind, origin: Origin) -> Self {
        IrElement {
            kind,
            parent: None,
            origin,
        }
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn location(&self) -> Option<&Location> {
        self.origin.location.as_ref()
    }

    pub fn span(&self) -> Option<&Span> {
        self.origin.span.as_ref()
    }
}
