//! file: core/src/passes/mod.rs
//! description: transformation passes over the IR tree.
//!
//! Each pass reads the tree through the visitor protocol and writes it only
//! through `IrTree::replace_element` (plus shape-neutral annotations).
//! Semantic problems found along the way are collected as `Diagnostic`s;
//! a returned `MutationError` means the pass itself broke a tree contract.
//!
//! `run_passes` runs them in order: match expansion, case expansion, closure
//! capture, local resolution.

pub mod closure;
pub mod desugar;
pub mod diagnostic;
pub mod resolve;

pub use closure::ClosureCapture;
pub use desugar::{CaseExpansion, MatchExpansion};
pub use diagnostic::Diagnostic;
pub use resolve::LocalResolution;

use crate::config::CompileOptions;
use crate::ir::{ElementId, ElementKind, IrTree, MutationError, Role, Value};
use crate::location::Origin;

pub trait Pass {
    fn name(&self) -> &'static str;
    fn run(&mut self, tree: &mut IrTree) -> Result<(), MutationError>;

    /// Diagnostics gathered by the last `run`.
    fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        Vec::new()
    }
}

/// Run the passes enabled in `options`, in pipeline order.
pub fn run_passes(tree: &mut IrTree, options: &CompileOptions) -> Result<Vec<Diagnostic>, MutationError> {
    let mut passes: Vec<Box<dyn Pass>> = Vec::new();
    if options.expand_matches {
        passes.push(Box::new(MatchExpansion::new()));
    }
    if options.expand_cases {
        passes.push(Box::new(CaseExpansion::new()));
    }
    if options.capture_closures {
        passes.push(Box::new(ClosureCapture::new()));
    }
    if options.resolve_locals {
        passes.push(Box::new(LocalResolution::new()));
    }

    let mut diagnostics = Vec::new();
    for pass in passes.iter_mut() {
        log::debug!("running pass '{}' on tree {}", pass.name(), tree.id());
        pass.run(tree)?;
        let found = pass.take_diagnostics();
        log::debug!("pass '{}' finished with {} diagnostic(s)", pass.name(), found.len());
        diagnostics.extend(found);
    }
    Ok(diagnostics)
}

/// Take `child` out of `owner`'s slot so it can be attached elsewhere.
///
/// A placeholder of the kind the slot demands is put in its place; the
/// placeholder stays in `owner`, which is expected to be discarded by the
/// caller's next replacement.
pub(crate) fn release(tree: &mut IrTree, owner: ElementId, child: ElementId) -> Result<ElementId, MutationError> {
    let owner_element = tree.get(owner)?;
    let role = owner_element
        .kind()
        .slots()
        .into_iter()
        .find(|(_, id)| *id == child)
        .map(|(role, _)| role);
    let Some(role) = role else {
        return Err(MutationError::NotAChild {
            tree: tree.id(),
            owner,
            owner_kind: owner_element.kind().name(),
            child,
            location: owner_element.location().cloned(),
        });
    };

    let placeholder = placeholder(tree, role)?;
    tree.replace_element(owner, child, placeholder)?;
    Ok(child)
}

fn placeholder(tree: &mut IrTree, role: Role) -> Result<ElementId, MutationError> {
    let origin = Origin::synthetic();
    match role {
        Role::Block | Role::ElseBranch => tree.alloc(ElementKind::Block { statements: Vec::new() }, origin),
        Role::Statement | Role::Expression => tree.alloc(ElementKind::Constant { value: Value::Null }, origin),
        Role::Clause(arm) => {
            let condition = tree.alloc(ElementKind::Constant { value: Value::Null }, origin.clone())?;
            let action = placeholder(tree, arm.action_role())?;
            tree.alloc(
                ElementKind::WhenClause {
                    condition,
                    action,
                    arm,
                },
                origin,
            )
        }
        Role::Function => {
            let body = tree.alloc(ElementKind::Block { statements: Vec::new() }, origin.clone())?;
            tree.alloc(
                ElementKind::Function {
                    name: String::new(),
                    params: Vec::new(),
                    body,
                    closure: true,
                    captures: Vec::new(),
                },
                origin,
            )
        }
    }
}
