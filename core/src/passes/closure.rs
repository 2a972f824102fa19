//! file: core/src/passes/closure.rs
//! description: closure capture analysis.
//!
//! For every closure function, computes the names it uses that are declared
//! in an enclosing function at the point the closure is created, in order of
//! first use, and records them as the function's `captures`. A name used by
//! a nested closure counts as a use by every closure between it and the
//! declaring function.
//!
//! The traversal only reads the tree; captures are written afterwards.

use crate::ir::{ElementId, ElementKind, IrTree, IrVisitor, MutationError};

use super::Pass;

#[derive(Debug)]
struct Frame {
    /// Block scopes; the first holds the parameters.
    scopes: Vec<Vec<String>>,
    /// Names used here but not declared here, in first-use order.
    free: Vec<String>,
}

impl Frame {
    fn declares(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.iter().any(|n| n == name))
    }
}

#[derive(Debug, Default)]
pub struct ClosureCapture {
    frames: Vec<Frame>,
    results: Vec<(ElementId, Vec<String>)>,
}

impl ClosureCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures computed by the last run, by closure function.
    pub fn results(&self) -> &[(ElementId, Vec<String>)] {
        &self.results
    }

    fn declare(&mut self, name: &str) {
        if let Some(scope) = self.frames.last_mut().and_then(|f| f.scopes.last_mut()) {
            scope.push(name.to_string());
        }
    }

    fn use_name(&mut self, name: &str) {
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        if !frame.declares(name) && !frame.free.iter().any(|n| n == name) {
            frame.free.push(name.to_string());
        }
    }

    fn visible_outside_current(&self, name: &str) -> bool {
        let depth = self.frames.len();
        if depth < 2 {
            return false;
        }
        self.frames[..depth - 1].iter().any(|f| f.declares(name))
    }
}

impl IrVisitor for ClosureCapture {
    fn visit_function(&mut self, tree: &IrTree, id: ElementId) {
        let (params, closure) = match tree.kind(id) {
            Some(ElementKind::Function { params, closure, .. }) => (params.clone(), *closure),
            _ => return,
        };
        self.frames.push(Frame {
            scopes: vec![params],
            free: Vec::new(),
        });
        tree.walk(id, self);
        let Some(frame) = self.frames.pop() else {
            return;
        };
        if !closure {
            return;
        }

        let captures: Vec<String> = frame
            .free
            .into_iter()
            .filter(|name| self.frames.iter().any(|f| f.declares(name)))
            .collect();
        for name in &captures {
            self.use_name(name);
        }
        self.results.push((id, captures));
    }

    fn visit_block(&mut self, tree: &IrTree, id: ElementId) {
        if let Some(frame) = self.frames.last_mut() {
            frame.scopes.push(Vec::new());
        }
        tree.walk(id, self);
        if let Some(frame) = self.frames.last_mut() {
            frame.scopes.pop();
        }
    }

    fn visit_assignment_statement(&mut self, tree: &IrTree, id: ElementId) {
        tree.walk(id, self);
        if let Some(ElementKind::AssignmentStatement { name, declaration, .. }) = tree.kind(id) {
            match declaration {
                Some(_) => self.declare(name),
                None => self.use_name(name),
            }
        }
    }

    fn visit_local_reference(&mut self, tree: &IrTree, id: ElementId) {
        if let Some(ElementKind::LocalReference { name, .. }) = tree.kind(id) {
            self.use_name(name);
        }
    }

    fn visit_function_invocation(&mut self, tree: &IrTree, id: ElementId) {
        if let Some(ElementKind::FunctionInvocation { name, .. }) = tree.kind(id) {
            // only calls through a local closure variable can capture
            let local = self.frames.last().map(|f| f.declares(name)).unwrap_or(false);
            if !local && self.visible_outside_current(name) {
                self.use_name(name);
            }
        }
        tree.walk(id, self);
    }
}

impl Pass for ClosureCapture {
    fn name(&self) -> &'static str {
        "closure-capture"
    }

    fn run(&mut self, tree: &mut IrTree) -> Result<(), MutationError> {
        self.frames.clear();
        self.results.clear();
        tree.traverse(self);
        for (function, captures) in self.results.clone() {
            log::trace!("closure {} captures [{}]", function, captures.join(", "));
            tree.set_captures(function, captures)?;
        }
        Ok(())
    }
}
