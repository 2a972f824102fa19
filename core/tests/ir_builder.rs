use trellis_core::ir::{build_ir, ElementId, ElementKind, IrTree};
use trellis_core::{parse_source, Level, SourceFile, TrellisErrorExt};

const PROGRAM: &str = r#"module demo

function main = || {
    let x = 3
    var y = 0
    case {
        when x > 0 { y = 1 }
        when x < 0 { y = 2 }
        otherwise { y = 3 }
    }
    let label = match { when y == 1 then "pos" otherwise "other" }
    print(label)
    return y
}
"#;

fn build(source: &str) -> IrTree {
    let unit = parse_source(&SourceFile::from_string("demo.trl", source)).expect("parse");
    build_ir(&unit).expect("build")
}

fn find(tree: &IrTree, kind: &str) -> Vec<ElementId> {
    tree.reachable_from_root()
        .into_iter()
        .filter(|id| tree.kind(*id).map(|k| k.name()) == Some(kind))
        .collect()
}

fn body_of(tree: &IrTree, function: ElementId) -> Vec<ElementId> {
    let Some(ElementKind::Function { body, .. }) = tree.kind(function) else {
        panic!("not a function");
    };
    match tree.kind(*body) {
        Some(ElementKind::Block { statements }) => statements.clone(),
        other => panic!("unexpected body {:?}", other),
    }
}

#[test]
fn parses_module_and_functions() {
    let unit = parse_source(&SourceFile::from_string("demo.trl", PROGRAM)).expect("parse");
    assert_eq!(unit.module, "demo");
    assert_eq!(unit.get_filename(), "demo.trl");
    assert_eq!(unit.functions.len(), 1);
}

#[test]
fn empty_source_is_rejected() {
    let err = parse_source(&SourceFile::from_string("empty.trl", "  \n")).err().expect("empty");
    assert_eq!(err.level(), Level::Error);
}

#[test]
fn syntax_errors_carry_a_location() {
    let err = parse_source(&SourceFile::from_string(
        "broken.trl",
        "module demo\nfunction main = || { let = 1 }\n",
    ))
    .err()
    .expect("syntax error");
    let location = err.location().expect("location");
    assert_eq!(location.line, 2);
}

#[test]
fn builds_module_rooted_tree() {
    let tree = build(PROGRAM);
    let root = tree.root().expect("root");
    assert!(matches!(
        tree.kind(root),
        Some(ElementKind::Module { name, .. }) if name == "demo"
    ));
    let main = tree.module_function("main").expect("main");
    assert_eq!(tree.parent(main), Some(root));
    tree.validate().expect("valid");

    // let, var, case, the split match declaration (two statements), print, return
    let statements = body_of(&tree, main);
    assert_eq!(statements.len(), 7);
    assert!(matches!(
        tree.kind(statements[3]),
        Some(ElementKind::AssignmentStatement { name, declaration: Some(_), .. }) if name == "label"
    ));
    assert!(matches!(
        tree.kind(statements[4]),
        Some(ElementKind::AssignmentStatement { declaration: None, .. })
    ));
}

#[test]
fn case_keeps_clause_order_and_origin() {
    let tree = build(PROGRAM);
    let cases = find(&tree, "CaseStatement");
    assert_eq!(cases.len(), 1);
    let case = cases[0];

    let clauses = tree.clauses(case);
    assert_eq!(clauses.len(), 2);
    let (first_guard, _) = tree.when_parts(clauses[0]).expect("first");
    assert!(matches!(
        tree.kind(first_guard),
        Some(ElementKind::BinaryOperation { operator, .. }) if operator.symbol() == ">"
    ));
    let fallback = tree.fallback(case).expect("fallback");
    assert!(matches!(tree.kind(fallback), Some(ElementKind::Block { .. })));

    let location = tree.element(case).and_then(|e| e.location()).expect("location");
    assert_eq!((location.line, location.column), (6, 5));
}

#[test]
fn match_lowers_to_value_alternatives() {
    let tree = build(PROGRAM);
    let matches = find(&tree, "MatchExpression");
    assert_eq!(matches.len(), 1);
    let fallback = tree.fallback(matches[0]).expect("fallback");
    assert!(matches!(tree.kind(fallback), Some(ElementKind::Constant { .. })));
}

#[test]
fn case_without_otherwise_is_rejected() {
    let unit = parse_source(&SourceFile::from_string(
        "no_fallback.trl",
        "module demo\nfunction main = || {\n    case { when true { print(1) } }\n}\n",
    ))
    .expect("parse");
    let err = build_ir(&unit).err().expect("missing fallback");
    assert!(err.message().contains("otherwise"), "{}", err.message());
    assert_eq!(err.location().map(|l| l.line), Some(3));
}

#[test]
fn case_without_clauses_is_rejected() {
    let unit = parse_source(&SourceFile::from_string(
        "no_clauses.trl",
        "module demo\nfunction main = || {\n    case { otherwise { print(1) } }\n}\n",
    ))
    .expect("parse");
    let err = build_ir(&unit).err().expect("no clauses");
    assert!(err.message().contains("no 'when' clauses"), "{}", err.message());
}

#[test]
fn closures_become_named_functions() {
    let tree = build(
        "module demo\nfunction main = || {\n    let base = 2\n    let add = |a| -> a + base\n    return add(1)\n}\n",
    );
    let references = find(&tree, "ClosureReference");
    assert_eq!(references.len(), 1);
    let Some(ElementKind::ClosureReference { function, .. }) = tree.kind(references[0]) else {
        panic!("closure reference");
    };
    match tree.kind(*function) {
        Some(ElementKind::Function {
            name, params, closure, ..
        }) => {
            assert_eq!(name, "main$closure$0");
            assert_eq!(params, &vec!["a".to_string()]);
            assert!(*closure);
        }
        other => panic!("unexpected {:?}", other),
    }
    let body = body_of(&tree, *function);
    assert_eq!(body.len(), 1);
    assert!(matches!(tree.kind(body[0]), Some(ElementKind::ReturnStatement { value: Some(_) })));
    assert_eq!(tree.enclosing_function(body[0]), Some(*function));
}

#[test]
fn else_if_chains_nest_conditionals() {
    let tree = build(
        "module demo\nfunction main = |n| {\n    if n > 1 { return 1 } else if n > 0 { return 2 } else { return 3 }\n}\n",
    );
    let main = tree.module_function("main").expect("main");
    let statements = body_of(&tree, main);
    let Some(ElementKind::ConditionalBranching { else_branch, .. }) = tree.kind(statements[0]) else {
        panic!("conditional");
    };
    let nested = else_branch.expect("else");
    assert!(matches!(
        tree.kind(nested),
        Some(ElementKind::ConditionalBranching { else_branch: Some(_), .. })
    ));
}
