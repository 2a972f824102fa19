//! file: core/src/ir/visit.rs
//! description: double-dispatch traversal of the IR tree.
//!
//! `IrTree::accept` calls the one visitor method for the element's kind;
//! `IrTree::walk` visits the element's children in slot order. Every visitor
//! method defaults to `walk`, so a visitor overrides only the kinds it cares
//! about and decides in the override whether to descend at all.
//!
//! `IrVisitor` reads the tree. `IrRewriter` gets the tree mutably and is how
//! passes rewrite it; its only structural write is `IrTree::replace_element`.
//!
use super::element::ElementId;
use super::err::MutationError;
use super::kind::ElementKind;
use super::tree::IrTree;

pub trait IrVisitor {
    fn visit_module(&mut self, tree: &IrTree, id: ElementId) {
        tree.walk(id, self);
    }
    fn visit_function(&mut self, tree: &IrTree, id: ElementId) {
        tree.walk(id, self);
    }
    fn visit_block(&mut self, tree: &IrTree, id: ElementId) {
        tree.walk(id, self);
    }
    fn visit_case_statement(&mut self, tree: &IrTree, id: ElementId) {
        tree.walk(id, self);
    }
    fn visit_when_clause(&mut self, tree: &IrTree, id: ElementId) {
        tree.walk(id, self);
    }
    fn visit_conditional_branching(&mut self, tree: &IrTree, id: ElementId) {
        tree.walk(id, self);
    }
    fn visit_loop_statement(&mut self, tree: &IrTree, id: ElementId) {
        tree.walk(id, self);
    }
    fn visit_assignment_statement(&mut self, tree: &IrTree, id: ElementId) {
        tree.walk(id, self);
    }
    fn visit_return_statement(&mut self, tree: &IrTree, id: ElementId) {
        tree.walk(id, self);
    }
    fn visit_constant(&mut self, tree: &IrTree, id: ElementId) {
        tree.walk(id, self);
    }
    fn visit_local_reference(&mut self, tree: &IrTree, id: ElementId) {
        tree.walk(id, self);
    }
    fn visit_binary_operation(&mut self, tree: &IrTree, id: ElementId) {
        tree.walk(id, self);
    }
    fn visit_unary_operation(&mut self, tree: &IrTree, id: ElementId) {
        tree.walk(id, self);
    }
    fn visit_function_invocation(&mut self, tree: &IrTree, id: ElementId) {
        tree.walk(id, self);
    }
    fn visit_closure_reference(&mut self, tree: &IrTree, id: ElementId) {
        tree.walk(id, self);
    }
    fn visit_match_expression(&mut self, tree: &IrTree, id: ElementId) {
        tree.walk(id, self);
    }
}

pub trait IrRewriter {
    fn visit_module(&mut self, tree: &mut IrTree, id: ElementId) -> Result<(), MutationError> {
        tree.walk_mut(id, self)
    }
    fn visit_function(&mut self, tree: &mut IrTree, id: ElementId) -> Result<(), MutationError> {
        tree.walk_mut(id, self)
    }
    fn visit_block(&mut self, tree: &mut IrTree, id: ElementId) -> Result<(), MutationError> {
        tree.walk_mut(id, self)
    }
    fn visit_case_statement(&mut self, tree: &mut IrTree, id: ElementId) -> Result<(), MutationError> {
        tree.walk_mut(id, self)
    }
    fn visit_when_clause(&mut self, tree: &mut IrTree, id: ElementId) -> Result<(), MutationError> {
        tree.walk_mut(id, self)
    }
    fn visit_conditional_branching(&mut self, tree: &mut IrTree, id: ElementId) -> Result<(), MutationError> {
        tree.walk_mut(id, self)
    }
    fn visit_loop_statement(&mut self, tree: &mut IrTree, id: ElementId) -> Result<(), MutationError> {
        tree.walk_mut(id, self)
    }
    fn visit_assignment_statement(&mut self, tree: &mut IrTree, id: ElementId) -> Result<(), MutationError> {
        tree.walk_mut(id, self)
    }
    fn visit_return_statement(&mut self, tree: &mut IrTree, id: ElementId) -> Result<(), MutationError> {
        tree.walk_mut(id, self)
    }
    fn visit_constant(&mut self, tree: &mut IrTree, id: ElementId) -> Result<(), MutationError> {
        tree.walk_mut(id, self)
    }
    fn visit_local_reference(&mut self, tree: &mut IrTree, id: ElementId) -> Result<(), MutationError> {
        tree.walk_mut(id, self)
    }
    fn visit_binary_operation(&mut self, tree: &mut IrTree, id: ElementId) -> Result<(), MutationError> {
        tree.walk_mut(id, self)
    }
    fn visit_unary_operation(&mut self, tree: &mut IrTree, id: ElementId) -> Result<(), MutationError> {
        tree.walk_mut(id, self)
    }
    fn visit_function_invocation(&mut self, tree: &mut IrTree, id: ElementId) -> Result<(), MutationError> {
        tree.walk_mut(id, self)
    }
    fn visit_closure_reference(&mut self, tree: &mut IrTree, id: ElementId) -> Result<(), MutationError> {
        tree.walk_mut(id, self)
    }
    fn visit_match_expression(&mut self, tree: &mut IrTree, id: ElementId) -> Result<(), MutationError> {
        tree.walk_mut(id, self)
    }
}

impl IrTree {
    /// Dispatch `id` to the visitor method for its kind. Unknown handles are
    /// ignored.
    pub fn accept<V: IrVisitor + ?Sized>(&self, id: ElementId, visitor: &mut V) {
        let Some(kind) = self.kind(id) else {
            return;
        };
        match kind {
            ElementKind::Module { .. } => visitor.visit_module(self, id),
            ElementKind::Function { .. } => visitor.visit_function(self, id),
            ElementKind::Block { .. } => visitor.visit_block(self, id),
            ElementKind::CaseStatement { .. } => visitor.visit_case_statement(self, id),
            ElementKind::WhenClause { .. } => visitor.visit_when_clause(self, id),
            ElementKind::ConditionalBranching { .. } => visitor.visit_conditional_branching(self, id),
            ElementKind::LoopStatement { .. } => visitor.visit_loop_statement(self, id),
            ElementKind::AssignmentStatement { .. } => visitor.visit_assignment_statement(self, id),
            ElementKind::ReturnStatement { .. } => visitor.visit_return_statement(self, id),
            ElementKind::Constant { .. } => visitor.visit_constant(self, id),
            ElementKind::LocalReference { .. } => visitor.visit_local_reference(self, id),
            ElementKind::BinaryOperation { .. } => visitor.visit_binary_operation(self, id),
            ElementKind::UnaryOperation { .. } => visitor.visit_unary_operation(self, id),
            ElementKind::FunctionInvocation { .. } => visitor.visit_function_invocation(self, id),
            ElementKind::ClosureReference { .. } => visitor.visit_closure_reference(self, id),
            ElementKind::MatchExpression { .. } => visitor.visit_match_expression(self, id),
        }
    }

    /// Accept every child of `id` in slot order. For a case statement that is
    /// each clause in turn, then the fallback.
    pub fn walk<V: IrVisitor + ?Sized>(&self, id: ElementId, visitor: &mut V) {
        for child in self.children(id) {
            self.accept(child, visitor);
        }
    }

    /// Run a visitor from the root, if the tree has one.
    pub fn traverse<V: IrVisitor + ?Sized>(&self, visitor: &mut V) {
        if let Some(root) = self.root() {
            self.accept(root, visitor);
        }
    }

    pub fn accept_mut<R: IrRewriter + ?Sized>(&mut self, id: ElementId, rewriter: &mut R) -> Result<(), MutationError> {
        let kind = self.get(id)?.kind();
        match kind {
            ElementKind::Module { .. } => rewriter.visit_module(self, id),
            ElementKind::Function { .. } => rewriter.visit_function(self, id),
            ElementKind::Block { .. } => rewriter.visit_block(self, id),
            ElementKind::CaseStatement { .. } => rewriter.visit_case_statement(self, id),
            ElementKind::WhenClause { .. } => rewriter.visit_when_clause(self, id),
            ElementKind::ConditionalBranching { .. } => rewriter.visit_conditional_branching(self, id),
            ElementKind::LoopStatement { .. } => rewriter.visit_loop_statement(self, id),
            ElementKind::AssignmentStatement { .. } => rewriter.visit_assignment_statement(self, id),
            ElementKind::ReturnStatement { .. } => rewriter.visit_return_statement(self, id),
            ElementKind::Constant { .. } => rewriter.visit_constant(self, id),
            ElementKind::LocalReference { .. } => rewriter.visit_local_reference(self, id),
            ElementKind::BinaryOperation { .. } => rewriter.visit_binary_operation(self, id),
            ElementKind::UnaryOperation { .. } => rewriter.visit_unary_operation(self, id),
            ElementKind::FunctionInvocation { .. } => rewriter.visit_function_invocation(self, id),
            ElementKind::ClosureReference { .. } => rewriter.visit_closure_reference(self, id),
            ElementKind::MatchExpression { .. } => rewriter.visit_match_expression(self, id),
        }
    }

    /// Mutable counterpart of `walk`. Children are re-read after each visit,
    /// so a child that replaced itself does not shift its siblings.
    pub fn walk_mut<R: IrRewriter + ?Sized>(&mut self, id: ElementId, rewriter: &mut R) -> Result<(), MutationError> {
        let mut index = 0;
        while let Some(child) = self.children(id).get(index).copied() {
            self.accept_mut(child, rewriter)?;
            index += 1;
        }
        Ok(())
    }

    pub fn traverse_mut<R: IrRewriter + ?Sized>(&mut self, rewriter: &mut R) -> Result<(), MutationError> {
        match self.root() {
            Some(root) => self.accept_mut(root, rewriter),
            None => Ok(()),
        }
    }
}
