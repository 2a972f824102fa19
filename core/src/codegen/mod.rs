//! file: core/src/codegen/mod.rs
//! description: bytecode generation from the resolved IR tree.
//!
//! `BytecodeGenerator` is a read-only `IrVisitor`. Each `Function` element,
//! top-level or lifted closure, becomes one `FunctionCode`; expressions
//! leave exactly one value on the stack and statements leave none.
//!
//! Every reference, assignment and call must carry the binding or target
//! written by local resolution. Case statements and match expressions that
//! were not expanded are compiled directly as a chain of guarded jumps.

pub mod function_builder;
pub mod op;
pub mod program;

pub use op::Op;
pub use program::{FunctionCode, Program};

use crate::error::{Level, TrellisErrorExt};
use crate::ir::{BinaryOperator, CallTarget, ElementId, ElementKind, IrTree, IrVisitor, UnaryOperator};
use crate::location::{Location, Span};

use self::function_builder::FunctionBuilder;

#[derive(Debug, Clone)]
pub struct CodegenError {
    level: Level,
    message: String,
    issuer: String,
    location: Option<Location>,
    span: Option<Span>,
}

impl CodegenError {
    pub fn with(
        level: Level,
        message: String,
        issuer: String,
        location: Option<Location>,
        span: Option<Span>,
    ) -> Self {
        CodegenError {
            level,
            message,
            issuer,
            location,
            span,
        }
    }
}

impl std::fmt::Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(loc) = &self.location {
            write!(f, "{} at {}", self.message, loc)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for CodegenError {}

impl TrellisErrorExt for CodegenError {
    fn level(&self) -> Level {
        self.level
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn issuer(&self) -> String {
        self.issuer.clone()
    }

    fn span(&self) -> Option<Span> {
        self.span.clone()
    }

    fn location(&self) -> Option<Location> {
        self.location.clone()
    }
}

#[derive(Debug, Default)]
pub struct BytecodeGenerator {
    module: String,
    functions: Vec<FunctionCode>,
    builders: Vec<FunctionBuilder>,
    error: Option<CodegenError>,
}

impl BytecodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the program for everything reachable from the root.
    pub fn generate(mut self, tree: &IrTree) -> Result<Program, CodegenError> {
        tree.traverse(&mut self);
        if let Some(error) = self.error {
            return Err(error);
        }
        log::debug!(
            "generated {} function(s) for module '{}'",
            self.functions.len(),
            self.module
        );
        Ok(Program {
            module: self.module,
            functions: self.functions,
        })
    }

    fn fail(&mut self, tree: &IrTree, id: ElementId, message: String) {
        if self.error.is_some() {
            return;
        }
        let (location, span) = match tree.element(id) {
            Some(e) => (e.location().cloned(), e.span().cloned()),
            None => (None, None),
        };
        self.error = Some(CodegenError::with(
            Level::Error,
            message,
            "trellis.codegen".to_string(),
            location,
            span,
        ));
    }

    fn emit(&mut self, op: Op) {
        if let Some(builder) = self.builders.last_mut() {
            builder.emit(op);
        }
    }

    fn builder(&mut self) -> Option<&mut FunctionBuilder> {
        self.builders.last_mut()
    }

    /// Guarded jump chain shared by case statements and match expressions.
    fn alternatives(&mut self, tree: &IrTree, id: ElementId) {
        let Some((clauses, otherwise)) = tree.alternatives(id) else {
            return;
        };
        let Some(builder) = self.builder() else {
            return;
        };
        let end = builder.new_label();
        for clause in clauses {
            let Some((condition, action)) = tree.when_parts(*clause) else {
                continue;
            };
            tree.accept(condition, self);
            let Some(builder) = self.builder() else {
                return;
            };
            let next = builder.new_label();
            builder.br_false(next);
            tree.accept(action, self);
            let Some(builder) = self.builder() else {
                return;
            };
            builder.jump(end);
            builder.mark(next);
        }
        tree.accept(otherwise, self);
        if let Some(builder) = self.builder() {
            builder.mark(end);
        }
    }
}

impl IrVisitor for BytecodeGenerator {
    fn visit_module(&mut self, tree: &IrTree, id: ElementId) {
        if let Some(ElementKind::Module { name, .. }) = tree.kind(id) {
            self.module = name.clone();
        }
        tree.walk(id, self);
    }

    fn visit_function(&mut self, tree: &IrTree, id: ElementId) {
        let Some(ElementKind::Function {
            name,
            params,
            body,
            captures,
            ..
        }) = tree.kind(id)
        else {
            return;
        };
        self.builders
            .push(FunctionBuilder::new(name, params.len(), captures.len()));
        tree.accept(*body, self);
        self.emit(Op::Const {
            value: crate::ir::Value::Null,
        });
        self.emit(Op::Ret);

        let Some(builder) = self.builders.pop() else {
            return;
        };
        match builder.finish() {
            Ok(code) => self.functions.push(code),
            Err(index) => self.fail(tree, id, format!("Unresolved branch at op {} in '{}'.", index, name)),
        }
    }

    fn visit_block(&mut self, tree: &IrTree, id: ElementId) {
        for statement in tree.children(id) {
            tree.accept(statement, self);
            let discard = tree.kind(statement).map(|k| k.is_expression()).unwrap_or(false);
            if discard {
                self.emit(Op::Pop);
            }
        }
    }

    fn visit_case_statement(&mut self, tree: &IrTree, id: ElementId) {
        self.alternatives(tree, id);
    }

    fn visit_match_expression(&mut self, tree: &IrTree, id: ElementId) {
        self.alternatives(tree, id);
    }

    fn visit_conditional_branching(&mut self, tree: &IrTree, id: ElementId) {
        let Some(ElementKind::ConditionalBranching {
            condition,
            then_block,
            else_branch,
        }) = tree.kind(id)
        else {
            return;
        };
        tree.accept(*condition, self);
        let Some(builder) = self.builder() else {
            return;
        };
        let otherwise = builder.new_label();
        let end = builder.new_label();
        builder.br_false(otherwise);
        tree.accept(*then_block, self);
        let Some(builder) = self.builder() else {
            return;
        };
        builder.jump(end);
        builder.mark(otherwise);
        if let Some(branch) = else_branch {
            tree.accept(*branch, self);
        }
        if let Some(builder) = self.builder() {
            builder.mark(end);
        }
    }

    fn visit_loop_statement(&mut self, tree: &IrTree, id: ElementId) {
        let Some(ElementKind::LoopStatement { condition, body }) = tree.kind(id) else {
            return;
        };
        let Some(builder) = self.builder() else {
            return;
        };
        let start = builder.new_label();
        let end = builder.new_label();
        builder.mark(start);
        tree.accept(*condition, self);
        if let Some(builder) = self.builder() {
            builder.br_false(end);
        }
        tree.accept(*body, self);
        if let Some(builder) = self.builder() {
            builder.jump(start);
            builder.mark(end);
        }
    }

    fn visit_assignment_statement(&mut self, tree: &IrTree, id: ElementId) {
        let Some(ElementKind::AssignmentStatement {
            name, value, binding, ..
        }) = tree.kind(id)
        else {
            return;
        };
        tree.accept(*value, self);
        match binding {
            Some(binding) => self.emit(Op::Store { slot: binding.slot }),
            None => self.fail(tree, id, format!("Assignment to '{}' was never resolved.", name)),
        }
    }

    fn visit_return_statement(&mut self, tree: &IrTree, id: ElementId) {
        match tree.kind(id) {
            Some(ElementKind::ReturnStatement { value: Some(value) }) => tree.accept(*value, self),
            _ => self.emit(Op::Const {
                value: crate::ir::Value::Null,
            }),
        }
        self.emit(Op::Ret);
    }

    fn visit_constant(&mut self, tree: &IrTree, id: ElementId) {
        if let Some(ElementKind::Constant { value }) = tree.kind(id) {
            self.emit(Op::Const { value: value.clone() });
        }
    }

    fn visit_local_reference(&mut self, tree: &IrTree, id: ElementId) {
        let Some(ElementKind::LocalReference { name, binding }) = tree.kind(id) else {
            return;
        };
        match binding {
            Some(binding) => self.emit(Op::Load { slot: binding.slot }),
            None => self.fail(tree, id, format!("Reference to '{}' was never resolved.", name)),
        }
    }

    fn visit_binary_operation(&mut self, tree: &IrTree, id: ElementId) {
        let Some(ElementKind::BinaryOperation { operator, left, right }) = tree.kind(id) else {
            return;
        };

        if matches!(operator, BinaryOperator::And | BinaryOperator::Or) {
            tree.accept(*left, self);
            let Some(builder) = self.builder() else {
                return;
            };
            let end = builder.new_label();
            builder.emit(Op::Dup);
            if *operator == BinaryOperator::And {
                builder.br_false(end);
            } else {
                builder.br_true(end);
            }
            builder.emit(Op::Pop);
            tree.accept(*right, self);
            if let Some(builder) = self.builder() {
                builder.mark(end);
            }
            return;
        }

        tree.accept(*left, self);
        tree.accept(*right, self);
        let op = match operator {
            BinaryOperator::Add => Op::Add,
            BinaryOperator::Sub => Op::Sub,
            BinaryOperator::Mul => Op::Mul,
            BinaryOperator::Div => Op::Div,
            BinaryOperator::Mod => Op::Mod,
            BinaryOperator::Eq => Op::Eq,
            BinaryOperator::Ne => Op::Neq,
            BinaryOperator::Lt => Op::Lt,
            BinaryOperator::Le => Op::Lte,
            BinaryOperator::Gt => Op::Gt,
            BinaryOperator::Ge => Op::Gte,
            BinaryOperator::And | BinaryOperator::Or => return,
        };
        self.emit(op);
    }

    fn visit_unary_operation(&mut self, tree: &IrTree, id: ElementId) {
        let Some(ElementKind::UnaryOperation { operator, operand }) = tree.kind(id) else {
            return;
        };
        tree.accept(*operand, self);
        self.emit(match operator {
            UnaryOperator::Neg => Op::Neg,
            UnaryOperator::Not => Op::Not,
        });
    }

    fn visit_function_invocation(&mut self, tree: &IrTree, id: ElementId) {
        let Some(ElementKind::FunctionInvocation {
            name,
            arguments,
            target,
        }) = tree.kind(id)
        else {
            return;
        };
        for argument in arguments {
            tree.accept(*argument, self);
        }
        let argc = arguments.len();
        match target {
            Some(CallTarget::Module) => self.emit(Op::Call {
                function: name.clone(),
                argc,
            }),
            Some(CallTarget::Builtin) => self.emit(Op::CallBuiltin {
                name: name.clone(),
                argc,
            }),
            Some(CallTarget::Local(binding)) => self.emit(Op::CallClosure {
                slot: binding.slot,
                argc,
            }),
            None => self.fail(tree, id, format!("Call to '{}' was never resolved.", name)),
        }
    }

    fn visit_closure_reference(&mut self, tree: &IrTree, id: ElementId) {
        let Some(ElementKind::ClosureReference { function, captured }) = tree.kind(id) else {
            return;
        };
        let Some(ElementKind::Function { name, captures, .. }) = tree.kind(*function) else {
            return;
        };
        if captures.len() != captured.len() {
            self.fail(
                tree,
                id,
                format!("Captures of closure '{}' were never resolved.", name),
            );
            return;
        }
        self.emit(Op::MakeClosure {
            function: name.clone(),
            captures: captured.iter().map(|b| b.slot).collect(),
        });
        tree.accept(*function, self);
    }
}

/// Generate bytecode for a resolved tree.
pub fn generate(tree: &IrTree) -> Result<Program, CodegenError> {
    BytecodeGenerator::new().generate(tree)
}
