//! file: core/src/syntax/mod.rs
//! description: raw syntax tree produced by the pest grammar.
//!
//! The syntax layer turns a `SourceFile` into a `CompilationUnit`: the module
//! name plus one `SyntaxNode` per function. The unit is read-only input for
//! the IR builder and is dropped once the IR tree exists. Syntax nodes have
//! their own visitor (`SyntaxVisitor`) so IR construction never goes through
//! the IR's dispatch.
//!
pub mod err;
pub mod expr;
pub mod kind;
pub mod node;
pub mod rules;
pub mod stmt;

pub use kind::SyntaxKind;
pub use node::SyntaxNode;
pub use rules::{Rule, TrellisParser};

use pest::Parser;

use crate::error::TrellisErrorExt;
use crate::location::Location;
use crate::source::SourceFile;

/// Visitor over the raw syntax tree.
pub trait SyntaxVisitor {
    type Unit;
    type Node;
    type Error;

    fn visit_compilation_unit(&mut self, unit: &CompilationUnit) -> Result<Self::Unit, Self::Error>;
    fn visit_node(&mut self, node: &SyntaxNode) -> Result<Self::Node, Self::Error>;
}

/// Root of the raw syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnit {
    filename: String,
    pub module: String,
    pub functions: Vec<SyntaxNode>,
    pub location: Option<Location>,
}

impl CompilationUnit {
    pub fn new(filename: &str, module: &str, location: Option<Location>) -> Self {
        CompilationUnit {
            filename: filename.to_string(),
            module: module.to_string(),
            functions: Vec::new(),
            location,
        }
    }

    pub fn get_filename(&self) -> &str {
        &self.filename
    }

    pub fn accept<V: SyntaxVisitor>(&self, visitor: &mut V) -> Result<V::Unit, V::Error> {
        visitor.visit_compilation_unit(self)
    }
}

impl std::fmt::Display for CompilationUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "CompilationUnit({}) module {}", self.filename, self.module)?;
        for function in &self.functions {
            write!(f, "{}", function)?;
        }
        Ok(())
    }
}

/// Parse a source file into its compilation unit.
pub fn parse_source(source: &SourceFile) -> Result<CompilationUnit, Box<dyn TrellisErrorExt>> {
    if source.is_empty() {
        return Err(Box::new(err::EmptySourceError::new(
            "trellis.syntax.parse_source".into(),
            Some(Location::new(&source.name, 1, 1)),
        )));
    }

    let mut pairs = TrellisParser::parse(Rule::compilation_unit, &source.content)
        .map_err(|e| Box::new(err::SyntaxError::from_pest(&source.name, e)) as Box<dyn TrellisErrorExt>)?;

    let unit_pair = pairs.next().ok_or_else(|| {
        Box::new(err::SyntaxError::with(
            crate::Level::Error,
            "Parser produced no compilation unit.".into(),
            "trellis.syntax.parse_source".into(),
            None,
            None,
        )) as Box<dyn TrellisErrorExt>
    })?;

    let unit = stmt::parse_compilation_unit_rule(unit_pair, source)
        .map_err(|e| Box::new(e) as Box<dyn TrellisErrorExt>)?;
    log::debug!(
        "parsed {} into module '{}' with {} function(s)",
        source.name,
        unit.module,
        unit.functions.len()
    );
    Ok(unit)
}
