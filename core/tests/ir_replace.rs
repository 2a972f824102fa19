use trellis_core::generate_error_report;
use trellis_core::ir::{
    Arm, Binding, BindingKind, CaseBuilder, ElementId, ElementKind, IrRewriter, IrTree, MutationError, Role, Value,
};
use trellis_core::location::Origin;

fn constant(tree: &mut IrTree, value: i64) -> ElementId {
    tree.alloc(ElementKind::Constant { value: Value::Int(value) }, Origin::synthetic())
        .expect("constant")
}

fn block(tree: &mut IrTree, statements: Vec<ElementId>) -> ElementId {
    tree.alloc(ElementKind::Block { statements }, Origin::synthetic())
        .expect("block")
}

fn clause(tree: &mut IrTree, arm: Arm) -> ElementId {
    let condition = tree
        .alloc(ElementKind::Constant { value: Value::Bool(true) }, Origin::synthetic())
        .expect("condition");
    let action = match arm {
        Arm::Statement => block(tree, Vec::new()),
        Arm::Value => constant(tree, 0),
    };
    tree.alloc(
        ElementKind::WhenClause {
            condition,
            action,
            arm,
        },
        Origin::synthetic(),
    )
    .expect("clause")
}

struct Fixture {
    tree: IrTree,
    case: ElementId,
    clause_a: ElementId,
    action_a: ElementId,
    fallback: ElementId,
}

fn fixture() -> Fixture {
    let mut tree = IrTree::new("replace.trl");
    let clause_a = clause(&mut tree, Arm::Statement);
    let (_, action_a) = tree.when_parts(clause_a).expect("parts");
    let fallback = block(&mut tree, Vec::new());

    let case = tree
        .alloc(
            ElementKind::CaseStatement {
                clauses: vec![clause_a],
                otherwise: fallback,
            },
            Origin::synthetic(),
        )
        .expect("case");
    let body = block(&mut tree, vec![case]);
    tree.set_root(body).expect("root");
    Fixture {
        tree,
        case,
        clause_a,
        action_a,
        fallback,
    }
}

fn snapshot(tree: &IrTree, ids: &[ElementId]) -> Vec<(Option<ElementKind>, Option<ElementId>)> {
    ids.iter()
        .map(|id| (tree.kind(*id).cloned(), tree.parent(*id)))
        .collect()
}

#[test]
fn replacing_fallback_with_non_block_is_a_type_mismatch() {
    let mut f = fixture();
    let stray = constant(&mut f.tree, 7);
    let watched = [f.case, f.fallback, stray, f.clause_a];
    let before = snapshot(&f.tree, &watched);

    let err = f.tree.replace_element(f.case, f.fallback, stray).err().expect("mismatch");
    match err {
        MutationError::TypeMismatch {
            owner,
            owner_kind,
            found,
            ..
        } => {
            assert_eq!(owner, f.case);
            assert_eq!(owner_kind, "CaseStatement");
            assert_eq!(found, "Constant");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(snapshot(&f.tree, &watched), before);
    assert_eq!(f.tree.fallback(f.case), Some(f.fallback));
}

#[test]
fn replacing_clause_with_block_reports_the_slot_role() {
    let mut f = fixture();
    let other = block(&mut f.tree, Vec::new());
    let err = f.tree.replace_element(f.case, f.clause_a, other).err().expect("mismatch");
    match err {
        MutationError::TypeMismatch { expected, found, .. } => {
            assert_eq!(expected, vec![Role::Clause(Arm::Statement)]);
            assert_eq!(found, "Block");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(f.tree.clauses(f.case), &[f.clause_a]);
}

#[test]
fn value_clause_does_not_fit_a_case() {
    let mut f = fixture();
    let value_clause = clause(&mut f.tree, Arm::Value);
    let err = f.tree.replace_element(f.case, f.clause_a, value_clause).err();
    assert!(matches!(err, Some(MutationError::TypeMismatch { .. })));
    assert_eq!(f.tree.parent(value_clause), None);
}

#[test]
fn original_must_be_a_current_child() {
    let mut f = fixture();
    let unrelated = block(&mut f.tree, Vec::new());
    let replacement = block(&mut f.tree, Vec::new());
    let err = f.tree.replace_element(f.case, unrelated, replacement).err();
    assert!(matches!(
        err,
        Some(MutationError::NotAChild { child, .. }) if child == unrelated
    ));
    assert_eq!(f.tree.parent(replacement), None);
}

#[test]
fn replaced_child_cannot_be_replaced_again() {
    let mut f = fixture();
    let first = block(&mut f.tree, Vec::new());
    f.tree.replace_element(f.case, f.fallback, first).expect("replace");
    assert_eq!(f.tree.parent(f.fallback), None);
    assert!(!f.tree.is_reachable(f.fallback));

    let second = block(&mut f.tree, Vec::new());
    let err = f.tree.replace_element(f.case, f.fallback, second).err();
    assert!(matches!(err, Some(MutationError::NotAChild { .. })));
    assert_eq!(f.tree.fallback(f.case), Some(first));
}

#[test]
fn owned_replacement_is_rejected() {
    let mut f = fixture();
    let err = f.tree.replace_element(f.case, f.fallback, f.action_a).err();
    assert!(matches!(
        err,
        Some(MutationError::StillOwned { element, holder, .. })
            if element == f.action_a && holder == f.clause_a
    ));
    assert_eq!(f.tree.parent(f.action_a), Some(f.clause_a));
    assert_eq!(f.tree.parent(f.fallback), Some(f.case));
}

#[test]
fn root_cannot_be_moved_below_itself() {
    let mut f = fixture();
    let root = f.tree.root().expect("root");
    let err = f.tree.replace_element(f.case, f.fallback, root).err();
    assert!(matches!(err, Some(MutationError::Cycle { element, .. }) if element == root));
    assert_eq!(f.tree.parent(root), None);
}

#[test]
fn replacing_with_itself_is_a_no_op() {
    let mut f = fixture();
    f.tree.replace_element(f.case, f.fallback, f.fallback).expect("no-op");
    assert_eq!(f.tree.parent(f.fallback), Some(f.case));
    f.tree.validate().expect("still valid");
}

#[test]
fn handles_from_another_tree_are_unknown() {
    let mut f = fixture();
    let mut other = IrTree::new("other.trl");
    let mut last = constant(&mut other, 0);
    for i in 0..f.tree.len() {
        last = constant(&mut other, i as i64);
    }
    let err = f.tree.replace_element(f.case, f.fallback, last).err();
    assert!(matches!(err, Some(MutationError::UnknownElement { element, .. }) if element == last));
}

#[test]
fn else_branch_accepts_a_nested_conditional() {
    let mut tree = IrTree::new("else.trl");
    let condition = constant(&mut tree, 1);
    let then_block = block(&mut tree, Vec::new());
    let else_block = block(&mut tree, Vec::new());
    let branch = tree
        .alloc(
            ElementKind::ConditionalBranching {
                condition,
                then_block,
                else_branch: Some(else_block),
            },
            Origin::synthetic(),
        )
        .expect("branch");

    let inner_condition = constant(&mut tree, 2);
    let inner_then = block(&mut tree, Vec::new());
    let nested = tree
        .alloc(
            ElementKind::ConditionalBranching {
                condition: inner_condition,
                then_block: inner_then,
                else_branch: None,
            },
            Origin::synthetic(),
        )
        .expect("nested");

    tree.replace_element(branch, else_block, nested).expect("else replaced");
    assert_eq!(tree.parent(nested), Some(branch));

    let err = tree.replace_element(branch, then_block, inner_condition).err();
    assert!(matches!(
        err,
        Some(MutationError::TypeMismatch { expected, .. }) if expected == vec![Role::Block]
    ));
}

#[test]
fn alloc_adopts_children_once() {
    let mut tree = IrTree::new("alloc.trl");
    let value = constant(&mut tree, 1);

    let err = tree
        .alloc(
            ElementKind::BinaryOperation {
                operator: trellis_core::ir::BinaryOperator::Add,
                left: value,
                right: value,
            },
            Origin::synthetic(),
        )
        .err();
    assert!(matches!(err, Some(MutationError::DuplicateChild { .. })));
    assert_eq!(tree.parent(value), None);

    let first = block(&mut tree, vec![value]);
    let err = tree
        .alloc(ElementKind::Block { statements: vec![value] }, Origin::synthetic())
        .err();
    assert!(matches!(
        err,
        Some(MutationError::StillOwned { holder, .. }) if holder == first
    ));

    let body = constant(&mut tree, 3);
    let err = tree
        .alloc(
            ElementKind::Function {
                name: "f".to_string(),
                params: Vec::new(),
                body,
                closure: false,
                captures: Vec::new(),
            },
            Origin::synthetic(),
        )
        .err();
    assert!(matches!(
        err,
        Some(MutationError::TypeMismatch { expected, .. }) if expected == vec![Role::Block]
    ));
}

#[test]
fn annotations_check_the_element_kind() {
    let mut tree = IrTree::new("annotate.trl");
    let value = constant(&mut tree, 1);
    let err = tree
        .bind_reference(
            value,
            Binding {
                slot: 0,
                kind: BindingKind::Local,
            },
        )
        .err();
    assert!(matches!(
        err,
        Some(MutationError::InvalidAnnotation { found: "Constant", .. })
    ));
}

#[test]
fn contract_errors_are_critical() {
    let mut tree = IrTree::new("report.trl");
    let condition = constant(&mut tree, 1);
    let action = block(&mut tree, Vec::new());
    let fallback = block(&mut tree, Vec::new());
    let mut builder = CaseBuilder::new(Origin::synthetic());
    builder.clause(condition, action);
    builder.otherwise(fallback).expect("fallback");
    let case = builder.build(&mut tree).expect("case");
    let stray = constant(&mut tree, 2);

    let err = tree.replace_element(case, fallback, stray).err().expect("mismatch");
    let report = generate_error_report(&err);
    assert!(report.starts_with("TRELLIS | CRITICAL"), "{}", report);
    assert!(report.contains("CaseStatement"), "{}", report);
}

/// Swaps every constant equal to `target` for a fresh constant while it is
/// being visited, and records each constant it is handed.
struct SwapDuringVisit {
    target: i64,
    visited: Vec<ElementId>,
    swapped: Vec<(ElementId, ElementId)>,
}

impl IrRewriter for SwapDuringVisit {
    fn visit_constant(&mut self, tree: &mut IrTree, id: ElementId) -> Result<(), MutationError> {
        self.visited.push(id);
        let matches_target = matches!(
            tree.kind(id),
            Some(ElementKind::Constant { value: Value::Int(v) }) if *v == self.target
        );
        let Some(owner) = tree.parent(id) else {
            return Ok(());
        };
        if matches_target {
            let fresh = tree.alloc(
                ElementKind::Constant {
                    value: Value::Int(self.target * 10),
                },
                Origin::synthetic(),
            )?;
            tree.replace_element(owner, id, fresh)?;
            self.swapped.push((id, fresh));
        }
        Ok(())
    }
}

#[test]
fn rewriting_walk_moves_past_a_child_replaced_during_its_visit() {
    let mut tree = IrTree::new("rewrite.trl");
    let first = constant(&mut tree, 1);
    let second = constant(&mut tree, 2);
    let third = constant(&mut tree, 3);
    let root = block(&mut tree, vec![first, second, third]);
    tree.set_root(root).expect("root");

    let mut rewriter = SwapDuringVisit {
        target: 2,
        visited: Vec::new(),
        swapped: Vec::new(),
    };
    tree.traverse_mut(&mut rewriter).expect("rewrite");

    assert_eq!(rewriter.swapped.len(), 1);
    let (old, fresh) = rewriter.swapped[0];
    assert_eq!(old, second);
    // each original sibling once, the new element not at all
    assert_eq!(rewriter.visited, vec![first, second, third]);
    assert!(!rewriter.visited.contains(&fresh));

    assert_eq!(tree.children(root), vec![first, fresh, third]);
    assert_eq!(tree.parent(fresh), Some(root));
    assert_eq!(tree.parent(second), None);
    assert!(!tree.is_reachable(second));
    tree.validate().expect("valid after rewrite");
}

#[test]
fn accept_mut_with_a_foreign_handle_is_rejected() {
    let mut tree = IrTree::new("empty.trl");
    let mut other = IrTree::new("other.trl");
    let foreign = constant(&mut other, 1);

    let mut rewriter = SwapDuringVisit {
        target: 1,
        visited: Vec::new(),
        swapped: Vec::new(),
    };
    let err = tree.accept_mut(foreign, &mut rewriter).expect_err("unknown");
    assert!(matches!(err, MutationError::UnknownElement { .. }));
    assert!(rewriter.visited.is_empty());
}
