use std::fmt::Write;

use super::element::ElementId;
use super::tree::IrTree;
use super::visit::IrVisitor;

/// Renders every visited element on its own line, indented by depth.
#[derive(Debug, Default)]
pub struct IrDumper {
    depth: usize,
    out: String,
}

impl IrDumper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn line(&mut self, tree: &IrTree, id: ElementId) {
        let Some(element) = tree.element(id) else {
            return;
        };
        let _ = write!(self.out, "{}{} {}", "  ".repeat(self.depth), id, element.kind());
        if let Some(loc) = element.location() {
            let _ = write!(self.out, " @{}:{}", loc.line, loc.column);
        }
        self.out.push('\n');

        self.depth += 1;
        tree.walk(id, self);
        self.depth -= 1;
    }
}

impl IrVisitor for IrDumper {
    fn visit_module(&mut self, tree: &IrTree, id: ElementId) {
        self.line(tree, id);
    }
    fn visit_function(&mut self, tree: &IrTree, id: ElementId) {
        self.line(tree, id);
    }
    fn visit_block(&mut self, tree: &IrTree, id: ElementId) {
        self.line(tree, id);
    }
    fn visit_case_statement(&mut self, tree: &IrTree, id: ElementId) {
        self.line(tree, id);
    }
    fn visit_when_clause(&mut self, tree: &IrTree, id: ElementId) {
        self.line(tree, id);
    }
    fn visit_conditional_branching(&mut self, tree: &IrTree, id: ElementId) {
        self.line(tree, id);
    }
    fn visit_loop_statement(&mut self, tree: &IrTree, id: ElementId) {
        self.line(tree, id);
    }
    fn visit_assignment_statement(&mut self, tree: &IrTree, id: ElementId) {
        self.line(tree, id);
    }
    fn visit_return_statement(&mut self, tree: &IrTree, id: ElementId) {
        self.line(tree, id);
    }
    fn visit_constant(&mut self, tree: &IrTree, id: ElementId) {
        self.line(tree, id);
    }
    fn visit_local_reference(&mut self, tree: &IrTree, id: ElementId) {
        self.line(tree, id);
    }
    fn visit_binary_operation(&mut self, tree: &IrTree, id: ElementId) {
        self.line(tree, id);
    }
    fn visit_unary_operation(&mut self, tree: &IrTree, id: ElementId) {
        self.line(tree, id);
    }
    fn visit_function_invocation(&mut self, tree: &IrTree, id: ElementId) {
        self.line(tree, id);
    }
    fn visit_closure_reference(&mut self, tree: &IrTree, id: ElementId) {
        self.line(tree, id);
    }
    fn visit_match_expression(&mut self, tree: &IrTree, id: ElementId) {
        self.line(tree, id);
    }
}

/// Indented text rendering of everything reachable from the root.
pub fn dump(tree: &IrTree) -> String {
    let mut dumper = IrDumper::new();
    tree.traverse(&mut dumper);
    dumper.finish()
}
