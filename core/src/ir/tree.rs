//! file: core/src/ir/tree.rs
//! description: arena-backed IR tree with parent tracking.
//!
//! Elements live in one `Vec` and refer to each other through `ElementId`
//! handles. Owners hold their children's handles in their `ElementKind`;
//! children hold a back-reference to their owner used only for lookup.
//!
//! Ownership is only ever established by the owner side: `alloc` adopts the
//! children named by the new element's kind, and `replace_element` moves a
//! free element into an existing slot. A child never claims a parent on its
//! own, so an element can be held by at most one slot at a time.
//!
//! Elements detached by a replacement stay in the arena as unreachable
//! orphans with no parent; they are freed together with the tree.
//!
use std::collections::HashSet;

use crate::location::{Location, Origin};

use super::element::{ElementId, IrElement, TreeId};
use super::err::MutationError;
use super::kind::{Binding, CallTarget, ElementKind, Role};

#[derive(Debug, Clone)]
pub struct IrTree {
    id: TreeId,
    source: String,
    elements: Vec<IrElement>,
    root: Option<ElementId>,
}

impl IrTree {
    pub fn new(source: &str) -> Self {
        IrTree {
            id: TreeId::new(),
            source: source.to_string(),
            elements: Vec::new(),
            root: None,
        }
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    /// Name of the source file the tree was built from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn root(&self) -> Option<ElementId> {
        self.root
    }

    /// Make `id` the tree root. The root must not be held by any owner.
    pub fn set_root(&mut self, id: ElementId) -> Result<(), MutationError> {
        let element = self.get(id)?;
        if let Some(holder) = element.parent {
            return Err(MutationError::StillOwned {
                tree: self.id,
                element: id,
                holder,
            });
        }
        self.root = Some(id);
        Ok(())
    }

    pub fn get(&self, id: ElementId) -> Result<&IrElement, MutationError> {
        self.elements
            .get(id.index())
            .ok_or(MutationError::UnknownElement {
                tree: self.id,
                element: id,
            })
    }

    /// Every handle in the arena, reachable or not, in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        (0..self.elements.len() as u32).map(ElementId)
    }

    pub fn element(&self, id: ElementId) -> Option<&IrElement> {
        self.elements.get(id.index())
    }

    pub fn kind(&self, id: ElementId) -> Option<&ElementKind> {
        self.element(id).map(|e| &e.kind)
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.element(id).and_then(|e| e.parent)
    }

    pub fn children(&self, id: ElementId) -> Vec<ElementId> {
        self.kind(id).map(|k| k.children()).unwrap_or_default()
    }

    /// Store a new element and adopt every child its kind names.
    ///
    /// Each child must exist, fit the role of its slot, appear only once and
    /// have no current owner. Nothing is stored unless all checks pass.
    pub fn alloc(&mut self, kind: ElementKind, origin: Origin) -> Result<ElementId, MutationError> {
        let id = ElementId(self.elements.len() as u32);
        self.check_adoption(kind.name(), &kind.slots(), origin.location.as_ref())?;

        let children = kind.children();
        self.elements.push(IrElement::new(kind, origin));
        for child in children {
            self.elements[child.index()].parent = Some(id);
        }
        Ok(id)
    }

    /// Run the adoption checks of `alloc` for an element of kind `owner_kind`
    /// that would hold `slots`, without storing anything.
    pub(crate) fn check_adoption(
        &self,
        owner_kind: &'static str,
        slots: &[(Role, ElementId)],
        location: Option<&Location>,
    ) -> Result<(), MutationError> {
        let owner = ElementId(self.elements.len() as u32);
        let mut seen = HashSet::new();
        for (role, child) in slots.iter().copied() {
            let child_element = self.get(child)?;
            if !role.accepts(&child_element.kind) {
                return Err(MutationError::TypeMismatch {
                    tree: self.id,
                    owner,
                    owner_kind,
                    expected: vec![role],
                    found: child_element.kind.name(),
                    location: location.cloned(),
                });
            }
            if !seen.insert(child) {
                return Err(MutationError::DuplicateChild {
                    tree: self.id,
                    element: child,
                });
            }
            if let Some(holder) = child_element.parent {
                return Err(MutationError::StillOwned {
                    tree: self.id,
                    element: child,
                    holder,
                });
            }
            if self.root == Some(child) {
                return Err(MutationError::Cycle {
                    tree: self.id,
                    owner,
                    element: child,
                });
            }
        }
        Ok(())
    }

    /// Drop every element allocated at or after `mark`, releasing the
    /// children they adopted. Only valid while nothing outside that range
    /// holds one of them.
    pub(crate) fn rollback(&mut self, mark: usize) {
        while self.elements.len() > mark {
            let Some(element) = self.elements.pop() else {
                break;
            };
            for child in element.kind.children() {
                if let Some(released) = self.elements.get_mut(child.index()) {
                    released.parent = None;
                }
            }
        }
        if self.root.is_some_and(|r| r.index() >= mark) {
            self.root = None;
        }
    }

    /// Substitute `replacement` for `original` in one of `owner`'s slots.
    ///
    /// Checks run before anything is touched: the replacement's kind must fit
    /// some role of the owner, `original` must currently sit in one of the
    /// owner's slots, the replacement must fit that slot's role and must be
    /// free (no parent, not the root, not an ancestor of the owner). On
    /// success the replacement's parent is `owner` and `original` has none.
    pub fn replace_element(
        &mut self,
        owner: ElementId,
        original: ElementId,
        replacement: ElementId,
    ) -> Result<(), MutationError> {
        let owner_element = self.get(owner)?;
        self.get(original)?;
        let replacement_element = self.get(replacement)?;

        let owner_kind = owner_element.kind.name();
        let location = owner_element.origin.location.clone();
        let slots = owner_element.kind.slots();
        let roles = owner_element.kind.accepted_roles();

        if !roles.is_empty() && !roles.iter().any(|r| r.accepts(&replacement_element.kind)) {
            return Err(MutationError::TypeMismatch {
                tree: self.id,
                owner,
                owner_kind,
                expected: roles,
                found: replacement_element.kind.name(),
                location,
            });
        }

        let position = slots
            .iter()
            .position(|(_, child)| *child == original)
            .ok_or(MutationError::NotAChild {
                tree: self.id,
                owner,
                owner_kind,
                child: original,
                location: location.clone(),
            })?;

        let slot_role: Role = slots[position].0;
        if !slot_role.accepts(&replacement_element.kind) {
            return Err(MutationError::TypeMismatch {
                tree: self.id,
                owner,
                owner_kind,
                expected: vec![slot_role],
                found: replacement_element.kind.name(),
                location,
            });
        }

        if original == replacement {
            return Ok(());
        }

        if let Some(holder) = replacement_element.parent {
            return Err(MutationError::StillOwned {
                tree: self.id,
                element: replacement,
                holder,
            });
        }

        if self.root == Some(replacement)
            || owner == replacement
            || self.ancestors(owner).contains(&replacement)
        {
            return Err(MutationError::Cycle {
                tree: self.id,
                owner,
                element: replacement,
            });
        }

        if let Some((_, slot)) = self.elements[owner.index()]
            .kind
            .slots_mut()
            .into_iter()
            .nth(position)
        {
            *slot = replacement;
        }
        self.elements[replacement.index()].parent = Some(owner);
        self.elements[original.index()].parent = None;

        log::trace!(
            "replaced {} with {} in {} {} (slot {})",
            original,
            replacement,
            owner_kind,
            owner,
            position
        );
        Ok(())
    }

    /// Parent chain of `id`, nearest first.
    pub fn ancestors(&self, id: ElementId) -> Vec<ElementId> {
        let mut chain = Vec::new();
        let mut current = self.parent(id);
        while let Some(p) = current {
            if chain.contains(&p) {
                break;
            }
            chain.push(p);
            current = self.parent(p);
        }
        chain
    }

    /// Nearest function strictly above `id`.
    pub fn enclosing_function(&self, id: ElementId) -> Option<ElementId> {
        self.ancestors(id)
            .into_iter()
            .find(|a| matches!(self.kind(*a), Some(ElementKind::Function { .. })))
    }

    /// Every element reachable from the root, in pre-order.
    pub fn reachable_from_root(&self) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut children = self.children(id);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    pub fn is_reachable(&self, id: ElementId) -> bool {
        if self.root == Some(id) {
            return true;
        }
        match self.ancestors(id).last() {
            Some(top) => self.root == Some(*top),
            None => false,
        }
    }

    /// Check the structural invariants of everything reachable from the root:
    /// each child fits its slot and points back at the owner holding it.
    pub fn validate(&self) -> Result<(), MutationError> {
        for owner in self.reachable_from_root() {
            let owner_element = self.get(owner)?;
            for (role, child) in owner_element.kind.slots() {
                let child_element = self.get(child)?;
                if !role.accepts(&child_element.kind) {
                    return Err(MutationError::TypeMismatch {
                        tree: self.id,
                        owner,
                        owner_kind: owner_element.kind.name(),
                        expected: vec![role],
                        found: child_element.kind.name(),
                        location: owner_element.origin.location.clone(),
                    });
                }
                if child_element.parent != Some(owner) {
                    return Err(MutationError::BrokenParentLink {
                        tree: self.id,
                        element: child,
                        expected: owner,
                        found: child_element.parent,
                    });
                }
            }
        }
        Ok(())
    }

    /// Clauses and fallback of a case statement or match expression.
    pub fn alternatives(&self, id: ElementId) -> Option<(&[ElementId], ElementId)> {
        match self.kind(id)? {
            ElementKind::CaseStatement { clauses, otherwise }
            | ElementKind::MatchExpression { clauses, otherwise } => Some((clauses.as_slice(), *otherwise)),
            _ => None,
        }
    }

    /// Ordered guarded clauses of a case or match; empty for other kinds.
    pub fn clauses(&self, id: ElementId) -> &[ElementId] {
        self.alternatives(id).map(|(c, _)| c).unwrap_or(&[])
    }

    pub fn fallback(&self, id: ElementId) -> Option<ElementId> {
        self.alternatives(id).map(|(_, o)| o)
    }

    /// Condition and action of a guarded clause.
    pub fn when_parts(&self, id: ElementId) -> Option<(ElementId, ElementId)> {
        match self.kind(id)? {
            ElementKind::WhenClause { condition, action, .. } => Some((*condition, *action)),
            _ => None,
        }
    }

    /// Top-level functions of the root module, by name.
    pub fn module_function(&self, name: &str) -> Option<ElementId> {
        match self.kind(self.root?)? {
            ElementKind::Module { functions, .. } => functions.iter().copied().find(|f| {
                matches!(self.kind(*f), Some(ElementKind::Function { name: n, .. }) if n == name)
            }),
            _ => None,
        }
    }

    // Annotations below never change the tree's shape.

    pub fn bind_reference(&mut self, id: ElementId, resolved: Binding) -> Result<(), MutationError> {
        let tree = self.id;
        let element = self
            .elements
            .get_mut(id.index())
            .ok_or(MutationError::UnknownElement { tree, element: id })?;
        match &mut element.kind {
            ElementKind::LocalReference { binding, .. }
            | ElementKind::AssignmentStatement { binding, .. } => {
                *binding = Some(resolved);
                Ok(())
            }
            other => Err(MutationError::InvalidAnnotation {
                tree,
                element: id,
                annotation: "binding",
                found: other.name(),
            }),
        }
    }

    pub fn set_call_target(&mut self, id: ElementId, resolved: CallTarget) -> Result<(), MutationError> {
        let tree = self.id;
        let element = self
            .elements
            .get_mut(id.index())
            .ok_or(MutationError::UnknownElement { tree, element: id })?;
        match &mut element.kind {
            ElementKind::FunctionInvocation { target, .. } => {
                *target = Some(resolved);
                Ok(())
            }
            other => Err(MutationError::InvalidAnnotation {
                tree,
                element: id,
                annotation: "call target",
                found: other.name(),
            }),
        }
    }

    pub fn set_captures(&mut self, id: ElementId, names: Vec<String>) -> Result<(), MutationError> {
        let tree = self.id;
        let element = self
            .elements
            .get_mut(id.index())
            .ok_or(MutationError::UnknownElement { tree, element: id })?;
        match &mut element.kind {
            ElementKind::Function { captures, .. } => {
                *captures = names;
                Ok(())
            }
            other => Err(MutationError::InvalidAnnotation {
                tree,
                element: id,
                annotation: "captures",
                found: other.name(),
            }),
        }
    }

    pub fn set_closure_bindings(&mut self, id: ElementId, bindings: Vec<Binding>) -> Result<(), MutationError> {
        let tree = self.id;
        let element = self
            .elements
            .get_mut(id.index())
            .ok_or(MutationError::UnknownElement { tree, element: id })?;
        match &mut element.kind {
            ElementKind::ClosureReference { captured, .. } => {
                *captured = bindings;
                Ok(())
            }
            other => Err(MutationError::InvalidAnnotation {
                tree,
                element: id,
                annotation: "closure bindings",
                found: other.name(),
            }),
        }
    }
}
