//! file: core/src/passes/resolve.rs
//! description: local resolution.
//!
//! Gives every name in a function a frame slot and binds each reference,
//! assignment and call to it. Slots are numbered per function: captures
//! first, then parameters, then locals in declaration order. Calls resolve
//! to a local closure, a module function or a builtin, in that order.
//!
//! Problems are reported as diagnostics; the traversal never stops early.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;

use crate::ir::{Binding, BindingKind, CallTarget, Declaration, ElementId, ElementKind, IrTree, IrVisitor, MutationError};
use crate::location::Origin;

use super::{Diagnostic, Pass};

lazy_static! {
    /// Functions provided by the runtime.
    pub static ref BUILTINS: HashSet<&'static str> = {
        let mut set = HashSet::new();
        set.insert("print");
        set.insert("println");
        set.insert("str");
        set.insert("len");
        set.insert("assert");
        set
    };
}

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(name)
}

#[derive(Debug, Clone, Copy)]
enum Mutability {
    Constant,
    Variable,
}

#[derive(Debug, Clone, Copy)]
struct Symbol {
    binding: Binding,
    mutability: Mutability,
}

/// Why a name could not be given a slot.
#[derive(Debug, Clone, Copy)]
enum Rejected {
    /// Already declared in the innermost scope.
    Duplicate,
    /// Every `u16` slot of the frame is taken.
    FrameFull,
    /// Declared with no enclosing function.
    NoFrame,
}

#[derive(Debug)]
struct Frame {
    function: String,
    scopes: Vec<HashMap<String, Symbol>>,
    /// Wider than a slot so the frame can tell when every slot is taken.
    next_slot: u32,
}

impl Frame {
    fn lookup(&self, name: &str) -> Option<Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name).copied())
    }
}

#[derive(Debug, Default)]
pub struct LocalResolution {
    frames: Vec<Frame>,
    module_functions: HashMap<String, usize>,
    bindings: Vec<(ElementId, Binding)>,
    targets: Vec<(ElementId, CallTarget)>,
    closure_bindings: Vec<(ElementId, Vec<Binding>)>,
    diagnostics: Vec<Diagnostic>,
}

impl LocalResolution {
    pub fn new() -> Self {
        Self::default()
    }

    fn origin(tree: &IrTree, id: ElementId) -> Origin {
        tree.element(id).map(|e| e.origin().clone()).unwrap_or_default()
    }

    fn error(&mut self, tree: &IrTree, id: ElementId, message: String) {
        let origin = Self::origin(tree, id);
        self.diagnostics
            .push(Diagnostic::error(message, "trellis.passes.resolve", &origin));
    }

    fn lookup(&self, name: &str) -> Option<Symbol> {
        self.frames.last().and_then(|f| f.lookup(name))
    }

    /// Add `name` to the innermost scope with the next free slot.
    fn declare(&mut self, name: &str, kind: BindingKind, mutability: Mutability) -> Result<Binding, Rejected> {
        let frame = self.frames.last_mut().ok_or(Rejected::NoFrame)?;
        let scope = frame.scopes.last_mut().ok_or(Rejected::NoFrame)?;
        if scope.contains_key(name) {
            return Err(Rejected::Duplicate);
        }
        let slot = u16::try_from(frame.next_slot).map_err(|_| Rejected::FrameFull)?;
        let binding = Binding { slot, kind };
        scope.insert(name.to_string(), Symbol { binding, mutability });
        frame.next_slot += 1;
        Ok(binding)
    }

    /// `declare`, turning a rejection into a diagnostic on `id`.
    fn declare_at(
        &mut self,
        tree: &IrTree,
        id: ElementId,
        name: &str,
        kind: BindingKind,
        mutability: Mutability,
        duplicate: String,
    ) -> Option<Binding> {
        match self.declare(name, kind, mutability) {
            Ok(binding) => Some(binding),
            Err(Rejected::Duplicate) => {
                self.error(tree, id, duplicate);
                None
            }
            Err(Rejected::FrameFull) => {
                let function = self.frames.last().map(|f| f.function.clone()).unwrap_or_default();
                let message = format!(
                    "Function '{}' declares '{}' past the limit of {} frame slots.",
                    function,
                    name,
                    u32::from(u16::MAX) + 1
                );
                self.error(tree, id, message);
                None
            }
            Err(Rejected::NoFrame) => {
                self.error(tree, id, format!("'{}' is declared outside any function.", name));
                None
            }
        }
    }
}

impl IrVisitor for LocalResolution {
    fn visit_module(&mut self, tree: &IrTree, id: ElementId) {
        let functions = match tree.kind(id) {
            Some(ElementKind::Module { functions, .. }) => functions.clone(),
            _ => return,
        };
        for function in &functions {
            if let Some(ElementKind::Function { name, params, .. }) = tree.kind(*function) {
                if self.module_functions.insert(name.clone(), params.len()).is_some() {
                    self.error(tree, *function, format!("Function '{}' is declared more than once.", name));
                }
            }
        }
        if !self.module_functions.contains_key("main") {
            let origin = Self::origin(tree, id);
            self.diagnostics.push(Diagnostic::warning(
                "Module has no 'main' function.".to_string(),
                "trellis.passes.resolve",
                &origin,
            ));
        }
        tree.walk(id, self);
    }

    fn visit_function(&mut self, tree: &IrTree, id: ElementId) {
        let (function, params, captures) = match tree.kind(id) {
            Some(ElementKind::Function {
                name, params, captures, ..
            }) => (name.clone(), params.clone(), captures.clone()),
            _ => return,
        };
        self.frames.push(Frame {
            function,
            scopes: vec![HashMap::new()],
            next_slot: 0,
        });
        for name in &captures {
            let duplicate = format!("Capture '{}' is listed more than once.", name);
            self.declare_at(tree, id, name, BindingKind::Captured, Mutability::Constant, duplicate);
        }
        for name in &params {
            let duplicate = format!("Parameter '{}' is declared more than once.", name);
            self.declare_at(tree, id, name, BindingKind::Parameter, Mutability::Variable, duplicate);
        }
        tree.walk(id, self);
        self.frames.pop();
    }

    fn visit_block(&mut self, tree: &IrTree, id: ElementId) {
        if let Some(frame) = self.frames.last_mut() {
            frame.scopes.push(HashMap::new());
        }
        tree.walk(id, self);
        if let Some(frame) = self.frames.last_mut() {
            frame.scopes.pop();
        }
    }

    fn visit_assignment_statement(&mut self, tree: &IrTree, id: ElementId) {
        tree.walk(id, self);
        let (name, declaration, initializer) = match tree.kind(id) {
            Some(ElementKind::AssignmentStatement {
                name,
                declaration,
                initializer,
                ..
            }) => (name.clone(), *declaration, *initializer),
            _ => return,
        };

        if let Some(declaration) = declaration {
            let mutability = match declaration {
                Declaration::Let => Mutability::Constant,
                Declaration::Var => Mutability::Variable,
            };
            let duplicate = format!("Variable '{}' is already declared in this scope.", name);
            if let Some(binding) = self.declare_at(tree, id, &name, BindingKind::Local, mutability, duplicate) {
                self.bindings.push((id, binding));
            }
            return;
        }

        match self.lookup(&name) {
            None => self.error(tree, id, format!("Assignment to undeclared variable '{}'.", name)),
            Some(symbol) if symbol.binding.kind == BindingKind::Captured => self.error(
                tree,
                id,
                format!("Cannot assign to captured variable '{}' inside a closure.", name),
            ),
            Some(symbol) if initializer => self.bindings.push((id, symbol.binding)),
            Some(Symbol {
                mutability: Mutability::Constant,
                ..
            }) => self.error(tree, id, format!("Cannot assign to constant '{}'.", name)),
            Some(symbol) => self.bindings.push((id, symbol.binding)),
        }
    }

    fn visit_local_reference(&mut self, tree: &IrTree, id: ElementId) {
        let Some(ElementKind::LocalReference { name, .. }) = tree.kind(id) else {
            return;
        };
        match self.lookup(name) {
            Some(symbol) => self.bindings.push((id, symbol.binding)),
            None => {
                let message = format!("Undeclared variable '{}'.", name);
                self.error(tree, id, message);
            }
        }
    }

    fn visit_function_invocation(&mut self, tree: &IrTree, id: ElementId) {
        tree.walk(id, self);
        let Some(ElementKind::FunctionInvocation { name, arguments, .. }) = tree.kind(id) else {
            return;
        };

        if let Some(symbol) = self.lookup(name) {
            self.targets.push((id, CallTarget::Local(symbol.binding)));
            return;
        }
        if let Some(arity) = self.module_functions.get(name).copied() {
            if arity != arguments.len() {
                let message = format!(
                    "Function '{}' expects {} argument(s) but {} were given.",
                    name,
                    arity,
                    arguments.len()
                );
                self.error(tree, id, message);
            }
            self.targets.push((id, CallTarget::Module));
            return;
        }
        if is_builtin(name) {
            self.targets.push((id, CallTarget::Builtin));
            return;
        }
        let message = format!("Unknown function '{}'.", name);
        self.error(tree, id, message);
    }

    fn visit_closure_reference(&mut self, tree: &IrTree, id: ElementId) {
        let Some(ElementKind::ClosureReference { function, .. }) = tree.kind(id) else {
            return;
        };
        let captures = match tree.kind(*function) {
            Some(ElementKind::Function { captures, .. }) => captures.clone(),
            _ => Vec::new(),
        };

        let mut bindings = Vec::with_capacity(captures.len());
        for name in &captures {
            match self.lookup(name) {
                Some(symbol) => bindings.push(symbol.binding),
                None => {
                    let message = format!("Captured variable '{}' is not in scope.", name);
                    self.error(tree, id, message);
                }
            }
        }
        self.closure_bindings.push((id, bindings));
        tree.walk(id, self);
    }
}

impl Pass for LocalResolution {
    fn name(&self) -> &'static str {
        "local-resolution"
    }

    fn run(&mut self, tree: &mut IrTree) -> Result<(), MutationError> {
        self.frames.clear();
        self.module_functions.clear();
        self.bindings.clear();
        self.targets.clear();
        self.closure_bindings.clear();
        tree.traverse(self);

        for (id, binding) in std::mem::take(&mut self.bindings) {
            tree.bind_reference(id, binding)?;
        }
        for (id, target) in std::mem::take(&mut self.targets) {
            tree.set_call_target(id, target)?;
        }
        for (id, bindings) in std::mem::take(&mut self.closure_bindings) {
            tree.set_closure_bindings(id, bindings)?;
        }
        Ok(())
    }

    fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
