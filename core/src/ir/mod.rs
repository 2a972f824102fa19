//! file: core/src/ir/mod.rs
//! description: the intermediate representation.
//!
//! An `IrTree` is an arena of `IrElement`s addressed by `ElementId`. Owners
//! hold their children's ids in their `ElementKind`, children record their
//! parent. Passes read the tree with `IrVisitor`, rewrite it with
//! `IrRewriter` and `IrTree::replace_element`, and never share an element
//! between two owners.

pub mod case;
pub mod dump;
pub mod element;
pub mod err;
pub mod kind;
pub mod lower;
pub mod tree;
pub mod value;
pub mod visit;

pub use case::{AlternativesBuilder, CaseBuilder, MatchBuilder};
pub use dump::dump;
pub use element::{ElementId, IrElement, TreeId};
pub use err::{ConstructionError, MutationError};
pub use kind::{
    Arm, BinaryOperator, Binding, BindingKind, CallTarget, Declaration, ElementKind, Role, UnaryOperator,
};
pub use lower::{BuildError, IrBuilder, build_ir};
pub use tree::IrTree;
pub use value::Value;
pub use visit::{IrRewriter, IrVisitor};
