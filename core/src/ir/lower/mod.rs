//! file: core/src/ir/lower/mod.rs
//! description: IR builder, lowering the raw syntax tree into an `IrTree`.
//!
//! `IrBuilder` is a `SyntaxVisitor`: the compilation unit becomes the root
//! `Module`, each syntax node becomes one element (or, for `let x = match`,
//! two statements). Statement and expression lowering live in `lower_stmt`
//! and `lower_expr`.
//!
//! A case or match without clauses or without an `otherwise` branch is a
//! build error; the builder never returns a tree containing one.

pub mod lower_expr;
pub mod lower_stmt;
pub mod lowering_context;

use crate::error::{Level, TrellisErrorExt};
use crate::ir::element::ElementId;
use crate::ir::err::{ConstructionError, MutationError};
use crate::ir::kind::ElementKind;
use crate::ir::tree::IrTree;
use crate::location::{Location, Origin, Span};
use crate::syntax::{CompilationUnit, SyntaxKind, SyntaxNode, SyntaxVisitor};

use self::lowering_context::LoweringContext;

#[derive(Debug, Clone)]
pub struct BuildError {
    level: Level,
    message: String,
    issuer: String,
    location: Option<Location>,
    span: Option<Span>,
}

impl BuildError {
    pub fn with(
        level: Level,
        message: String,
        issuer: String,
        location: Option<Location>,
        span: Option<Span>,
    ) -> Self {
        BuildError {
            level,
            message,
            issuer,
            location,
            span,
        }
    }

    /// Malformed syntax tree at `node`.
    pub(crate) fn malformed(node: &SyntaxNode, message: String, issuer: &str) -> Self {
        BuildError::with(
            Level::Error,
            message,
            issuer.to_string(),
            node.location.clone(),
            node.span.clone(),
        )
    }
}

impl From<MutationError> for BuildError {
    fn from(error: MutationError) -> Self {
        BuildError {
            level: error.level(),
            message: error.message(),
            issuer: error.issuer(),
            location: error.location(),
            span: None,
        }
    }
}

impl From<ConstructionError> for BuildError {
    fn from(error: ConstructionError) -> Self {
        BuildError {
            level: error.level(),
            message: error.message(),
            issuer: error.issuer(),
            location: error.location(),
            span: None,
        }
    }
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(loc) = &self.location {
            write!(f, "{} at {}", self.message, loc)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for BuildError {}

impl TrellisErrorExt for BuildError {
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

/// Builds one `IrTree` per compilation unit.
pub struct IrBuilder {
    tree: IrTree,
    pub(crate) ctx: LoweringContext,
}

impl IrBuilder {
    pub fn new() -> Self {
        IrBuilder {
            tree: IrTree::new(""),
            ctx: LoweringContext::new(),
        }
    }

    pub(crate) fn tree_mut(&mut self) -> &mut IrTree {
        &mut self.tree
    }

    pub(crate) fn alloc(&mut self, kind: ElementKind, node: &SyntaxNode) -> Result<ElementId, BuildError> {
        Ok(self.tree.alloc(kind, node.origin())?)
    }

    pub(crate) fn alloc_with(&mut self, kind: ElementKind, origin: Origin) -> Result<ElementId, BuildError> {
        Ok(self.tree.alloc(kind, origin)?)
    }

    /// Lower a top-level or lifted function.
    pub(crate) fn lower_function(
        &mut self,
        name: &str,
        params: &[String],
        body: &SyntaxNode,
        closure: bool,
        origin: Origin,
    ) -> Result<ElementId, BuildError> {
        self.ctx.enter_function(name);
        let body = match body.get_kind() {
            SyntaxKind::Block => lower_stmt::lower_block(self, body),
            // `|x| -> expr` lowers to a block returning the expression
            _ => {
                let value = self.visit_node(body)?;
                let ret = self.alloc(ElementKind::ReturnStatement { value: Some(value) }, body)?;
                self.alloc(
                    ElementKind::Block {
                        statements: vec![ret],
                    },
                    body,
                )
            }
        };
        self.ctx.exit_function();
        let body = body?;
        self.alloc_with(
            ElementKind::Function {
                name: name.to_string(),
                params: params.to_vec(),
                body,
                closure,
                captures: Vec::new(),
            },
            origin,
        )
    }
}

impl Default for IrBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxVisitor for IrBuilder {
    type Unit = IrTree;
    type Node = ElementId;
    type Error = BuildError;

    fn visit_compilation_unit(&mut self, unit: &CompilationUnit) -> Result<IrTree, BuildError> {
        self.tree = IrTree::new(unit.get_filename());
        self.ctx = LoweringContext::new();

        let mut functions = Vec::with_capacity(unit.functions.len());
        for function in &unit.functions {
            functions.push(function.accept(self)?);
        }
        let module = self.alloc_with(
            ElementKind::Module {
                name: unit.module.clone(),
                functions,
            },
            Origin::new(unit.location.clone(), None),
        )?;
        self.tree.set_root(module)?;
        self.tree.validate()?;

        log::debug!(
            "built IR tree {} for module '{}' ({} elements)",
            self.tree.id(),
            unit.module,
            self.tree.len()
        );
        Ok(std::mem::replace(&mut self.tree, IrTree::new("")))
    }

    fn visit_node(&mut self, node: &SyntaxNode) -> Result<ElementId, BuildError> {
        match node.get_kind() {
            SyntaxKind::Function { name, params } => {
                let body = node.children.first().ok_or_else(|| {
                    BuildError::malformed(
                        node,
                        format!("Function '{}' has no body.", name),
                        "trellis.ir.lower.visit_node",
                    )
                })?;
                self.lower_function(name, params, body, false, node.origin())
            }
            kind if kind.is_expression() => lower_expr::lower_expression(self, node),
            _ => lower_stmt::lower_statement(self, node),
        }
    }
}

/// Build the IR tree for a parsed compilation unit.
pub fn build_ir(unit: &CompilationUnit) -> Result<IrTree, BuildError> {
    let mut builder = IrBuilder::new();
    unit.accept(&mut builder)
}
