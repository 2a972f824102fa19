use crate::location::{Location, Origin, Span};

use super::kind::SyntaxKind;

/// A raw syntax node: a kind, its ordered children and where it came from.
#[derive(Clone, PartialEq)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    pub children: Vec<SyntaxNode>,
    pub location: Option<Location>,
    pub span: Option<Span>,
}

impl SyntaxNode {
    pub fn new(kind: SyntaxKind, location: Option<Location>, span: Option<Span>) -> Self {
        SyntaxNode {
            kind,
            children: Vec::new(),
            location,
            span,
        }
    }

    pub fn with_children(mut self, children: Vec<SyntaxNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_child(mut self, child: SyntaxNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn get_kind(&self) -> &SyntaxKind {
        &self.kind
    }

    pub fn origin(&self) -> Origin {
        Origin::new(self.location.clone(), self.span.clone())
    }

    /// Syntax-side dispatch entry; distinct from `IrTree::accept`.
    pub fn accept<V: super::SyntaxVisitor>(&self, visitor: &mut V) -> Result<V::Node, V::Error> {
        visitor.visit_node(self)
    }
}

use std::fmt;

impl fmt::Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_node(f: &mut fmt::Formatter<'_>, node: &SyntaxNode, indent: usize) -> fmt::Result {
            for _ in 0..indent {
                write!(f, "  ")?;
            }
            match &node.location {
                Some(loc) => writeln!(f, "{} @{}:{}", node.kind, loc.line, loc.column)?,
                None => writeln!(f, "{}", node.kind)?,
            }
            for child in &node.children {
                write_node(f, child, indent + 1)?;
            }
            Ok(())
        }
        write_node(f, self, 0)
    }
}

impl fmt::Debug for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
