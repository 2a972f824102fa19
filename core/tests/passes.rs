use trellis_core::ir::{
    build_ir, Binding, BindingKind, CallTarget, Declaration, ElementId, ElementKind, IrTree, Value,
};
use trellis_core::location::Origin;
use trellis_core::passes::{CaseExpansion, ClosureCapture, LocalResolution, MatchExpansion, Pass};
use trellis_core::{parse_source, run_passes, CompileOptions, Level, SourceFile, TrellisErrorExt};

fn build(source: &str) -> IrTree {
    let unit = parse_source(&SourceFile::from_string("passes.trl", source)).expect("parse");
    build_ir(&unit).expect("build")
}

fn find(tree: &IrTree, kind: &str) -> Vec<ElementId> {
    tree.reachable_from_root()
        .into_iter()
        .filter(|id| tree.kind(*id).map(|k| k.name()) == Some(kind))
        .collect()
}

fn function_named(tree: &IrTree, wanted: &str) -> ElementId {
    find(tree, "Function")
        .into_iter()
        .find(|id| matches!(tree.kind(*id), Some(ElementKind::Function { name, .. }) if name == wanted))
        .unwrap_or_else(|| panic!("no function {}", wanted))
}

fn statements(tree: &IrTree, block: ElementId) -> Vec<ElementId> {
    match tree.kind(block) {
        Some(ElementKind::Block { statements }) => statements.clone(),
        other => panic!("expected a block, found {:?}", other),
    }
}

fn body(tree: &IrTree, function: ElementId) -> Vec<ElementId> {
    match tree.kind(function) {
        Some(ElementKind::Function { body, .. }) => statements(tree, *body),
        other => panic!("expected a function, found {:?}", other),
    }
}

fn reference_binding(tree: &IrTree, function: ElementId, wanted: &str) -> Option<Binding> {
    find(tree, "LocalReference").into_iter().find_map(|id| match tree.kind(id) {
        Some(ElementKind::LocalReference { name, binding }) if name == wanted => {
            if tree.enclosing_function(id) == Some(function) {
                *binding
            } else {
                None
            }
        }
        _ => None,
    })
}

const MATCHING: &str = r#"module demo

function main = || {
    var y = 1
    let label = match { when y == 1 then "one" when y == 2 then "two" otherwise "many" }
    print(label)
}

function pick = |n| {
    return match { when n > 0 then 1 otherwise 2 }
}
"#;

#[test]
fn match_expansion_assigns_in_every_arm() {
    let mut tree = build(MATCHING);
    let matches = find(&tree, "MatchExpression");
    assert_eq!(matches.len(), 2);
    let first_clause = tree.clauses(matches[0])[0];
    let (_, first_value) = tree.when_parts(first_clause).expect("parts");

    let mut pass = MatchExpansion::new();
    pass.run(&mut tree).expect("expand");
    assert_eq!(pass.expanded(), 2);
    assert!(find(&tree, "MatchExpression").is_empty());
    tree.validate().expect("valid");

    let main = tree.module_function("main").expect("main");
    let main_body = body(&tree, main);
    let case = main_body[2];
    assert!(matches!(tree.kind(case), Some(ElementKind::CaseStatement { .. })));
    assert_eq!(tree.clauses(case).len(), 2);

    // the clause value moved into an assignment, keeping its identity
    let holder = tree.parent(first_value).expect("moved value");
    assert!(matches!(
        tree.kind(holder),
        Some(ElementKind::AssignmentStatement { name, declaration: None, .. }) if name == "label"
    ));
    assert!(matches!(
        tree.kind(first_value),
        Some(ElementKind::Constant { value: Value::Str(s) }) if s == "one"
    ));

    let fallback = tree.fallback(case).expect("fallback");
    let fallback_body = statements(&tree, fallback);
    assert_eq!(fallback_body.len(), 1);
    assert!(matches!(
        tree.kind(fallback_body[0]),
        Some(ElementKind::AssignmentStatement { name, .. }) if name == "label"
    ));
}

#[test]
fn match_expansion_returns_in_every_arm() {
    let mut tree = build(MATCHING);
    MatchExpansion::new().run(&mut tree).expect("expand");

    let pick = tree.module_function("pick").expect("pick");
    let pick_body = body(&tree, pick);
    assert_eq!(pick_body.len(), 1);
    let fallback = tree.fallback(pick_body[0]).expect("case fallback");
    let returned = statements(&tree, fallback);
    assert!(matches!(
        tree.kind(returned[0]),
        Some(ElementKind::ReturnStatement { value: Some(_) })
    ));
}

const CASES: &str = r#"module demo

function main = |x| {
    case {
        when x > 0 { print("positive") }
        when x < 0 { print("negative") }
        otherwise { print("zero") }
    }
}
"#;

#[test]
fn case_expansion_builds_a_conditional_chain() {
    let mut tree = build(CASES);
    let case = find(&tree, "CaseStatement")[0];
    let clauses = tree.clauses(case).to_vec();
    let (guard_a, action_a) = tree.when_parts(clauses[0]).expect("a");
    let (guard_b, action_b) = tree.when_parts(clauses[1]).expect("b");
    let fallback = tree.fallback(case).expect("fallback");

    let mut pass = CaseExpansion::new();
    pass.run(&mut tree).expect("expand");
    assert_eq!(pass.expanded(), 1);
    assert!(find(&tree, "CaseStatement").is_empty());
    assert!(!tree.is_reachable(case));
    assert_eq!(tree.parent(case), None);
    tree.validate().expect("valid");

    let main = tree.module_function("main").expect("main");
    let outer = body(&tree, main)[0];
    let Some(ElementKind::ConditionalBranching {
        condition,
        then_block,
        else_branch: Some(inner),
    }) = tree.kind(outer).cloned()
    else {
        panic!("outer conditional");
    };
    assert_eq!((condition, then_block), (guard_a, action_a));

    let Some(ElementKind::ConditionalBranching {
        condition,
        then_block,
        else_branch,
    }) = tree.kind(inner).cloned()
    else {
        panic!("inner conditional");
    };
    assert_eq!((condition, then_block), (guard_b, action_b));
    assert_eq!(else_branch, Some(fallback));
    assert_eq!(tree.parent(fallback), Some(inner));
}

#[test]
fn nested_cases_expand_inside_out() {
    let mut tree = build(
        "module demo\nfunction main = |x| {\n    case {\n        when x > 0 {\n            case { when x > 9 { print(1) } otherwise { print(2) } }\n        }\n        otherwise { print(3) }\n    }\n}\n",
    );
    let mut pass = CaseExpansion::new();
    pass.run(&mut tree).expect("expand");
    assert_eq!(pass.expanded(), 2);
    assert_eq!(find(&tree, "ConditionalBranching").len(), 2);
    tree.validate().expect("valid");
}

const CLOSURES: &str = r#"module demo

function main = || {
    let base = 10
    var unused = 0
    let add = |a| -> a + base
    let nested = |a| {
        let g = |b| -> b + base + a
        return g(1)
    }
    return add(1)
}
"#;

fn captures(tree: &IrTree, function: ElementId) -> Vec<String> {
    match tree.kind(function) {
        Some(ElementKind::Function { captures, .. }) => captures.clone(),
        _ => Vec::new(),
    }
}

#[test]
fn closures_capture_enclosing_names_in_first_use_order() {
    let mut tree = build(CLOSURES);
    ClosureCapture::new().run(&mut tree).expect("capture");

    let add = function_named(&tree, "main$closure$0");
    let nested = function_named(&tree, "main$closure$1");
    let inner = function_named(&tree, "main$closure$1$closure$0");
    assert_eq!(captures(&tree, add), vec!["base".to_string()]);
    assert_eq!(captures(&tree, inner), vec!["base".to_string(), "a".to_string()]);
    // `base` passes through `nested` on its way to the inner closure
    assert_eq!(captures(&tree, nested), vec!["base".to_string()]);
    assert!(captures(&tree, tree.module_function("main").expect("main")).is_empty());
}

#[test]
fn locals_resolve_to_frame_slots() {
    let mut tree = build(CLOSURES);
    ClosureCapture::new().run(&mut tree).expect("capture");
    let mut resolution = LocalResolution::new();
    resolution.run(&mut tree).expect("resolve");
    let diagnostics = resolution.take_diagnostics();
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);

    let inner = function_named(&tree, "main$closure$1$closure$0");
    assert_eq!(
        reference_binding(&tree, inner, "a"),
        Some(Binding {
            slot: 1,
            kind: BindingKind::Captured
        })
    );
    assert_eq!(
        reference_binding(&tree, inner, "b"),
        Some(Binding {
            slot: 2,
            kind: BindingKind::Parameter
        })
    );

    let nested = function_named(&tree, "main$closure$1");
    let reference = find(&tree, "ClosureReference")
        .into_iter()
        .find(|id| tree.enclosing_function(*id) == Some(nested))
        .expect("inner closure reference");
    assert!(matches!(
        tree.kind(reference),
        Some(ElementKind::ClosureReference { captured, .. }) if captured == &vec![
            Binding { slot: 0, kind: BindingKind::Captured },
            Binding { slot: 1, kind: BindingKind::Parameter },
        ]
    ));

    let main = tree.module_function("main").expect("main");
    let main_body = body(&tree, main);
    let Some(ElementKind::ReturnStatement { value: Some(call) }) = tree.kind(main_body[4]) else {
        panic!("return");
    };
    assert!(matches!(
        tree.kind(*call),
        Some(ElementKind::FunctionInvocation {
            target: Some(CallTarget::Local(Binding { slot: 2, kind: BindingKind::Local })),
            ..
        })
    ));
}

#[test]
fn semantic_problems_become_diagnostics() {
    let mut tree = build(
        r#"module demo

function main = || {
    let k = 1
    k = 2
    print(missing)
    unknown(1)
    helper(1, 2)
    let k = 3
    var c = 0
    let h = || { c = 1 }
    undeclared = 4
}

function helper = |a| { return a }
"#,
    );
    let diagnostics = run_passes(&mut tree, &CompileOptions::default()).expect("passes");
    let messages: Vec<String> = diagnostics.iter().map(|d| d.message()).collect();

    for expected in [
        "Cannot assign to constant 'k'.",
        "Undeclared variable 'missing'.",
        "Unknown function 'unknown'.",
        "Function 'helper' expects 1 argument(s) but 2 were given.",
        "Variable 'k' is already declared in this scope.",
        "Cannot assign to captured variable 'c' inside a closure.",
        "Assignment to undeclared variable 'undeclared'.",
    ] {
        assert!(messages.iter().any(|m| m == expected), "missing {:?} in {:?}", expected, messages);
    }
    assert!(diagnostics.iter().all(|d| d.is_error()));
    assert!(diagnostics.iter().all(|d| d.issuer() == "trellis.passes.resolve"));
}

fn constant_errors(source: &str, options: &CompileOptions) -> Vec<String> {
    let mut tree = build(source);
    let diagnostics = run_passes(&mut tree, options).expect("passes");
    diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(|d| d.message())
        .collect()
}

#[test]
fn let_bound_to_a_match_stays_constant() {
    let reassigned = r#"module demo
function main = || {
    let y = 1
    let x = match { when y > 0 then 1 otherwise 2 }
    x = 5
    return x
}
"#;
    let initialized_only = r#"module demo
function main = || {
    let y = 1
    let x = match { when y > 0 then 1 otherwise 2 }
    var z = match { when y > 0 then 3 otherwise 4 }
    z = 5
    return x + z
}
"#;
    let unexpanded = CompileOptions {
        expand_matches: false,
        ..CompileOptions::default()
    };
    for options in [CompileOptions::default(), unexpanded] {
        assert_eq!(
            constant_errors(reassigned, &options),
            vec!["Cannot assign to constant 'x'.".to_string()]
        );
        assert!(constant_errors(initialized_only, &options).is_empty());
    }
}

#[test]
fn frame_slots_run_out_with_a_diagnostic() {
    let mut tree = IrTree::new("wide.trl");
    let value = tree
        .alloc(ElementKind::Constant { value: Value::Int(1) }, Origin::synthetic())
        .expect("value");
    let extra = tree
        .alloc(
            ElementKind::AssignmentStatement {
                name: "extra".to_string(),
                declaration: Some(Declaration::Let),
                value,
                binding: None,
                initializer: false,
            },
            Origin::synthetic(),
        )
        .expect("declaration");
    let body = tree
        .alloc(ElementKind::Block { statements: vec![extra] }, Origin::synthetic())
        .expect("body");
    // one parameter for every slot a frame has
    let params: Vec<String> = (0..=u32::from(u16::MAX)).map(|i| format!("p{}", i)).collect();
    let main = tree
        .alloc(
            ElementKind::Function {
                name: "main".to_string(),
                params,
                body,
                closure: false,
                captures: Vec::new(),
            },
            Origin::synthetic(),
        )
        .expect("main");
    let module = tree
        .alloc(
            ElementKind::Module {
                name: "wide".to_string(),
                functions: vec![main],
            },
            Origin::synthetic(),
        )
        .expect("module");
    tree.set_root(module).expect("root");

    let mut resolution = LocalResolution::new();
    resolution.run(&mut tree).expect("resolve");
    let messages: Vec<String> = resolution.take_diagnostics().iter().map(|d| d.message()).collect();
    assert_eq!(
        messages,
        vec!["Function 'main' declares 'extra' past the limit of 65536 frame slots.".to_string()]
    );
    assert!(matches!(
        tree.kind(extra),
        Some(ElementKind::AssignmentStatement { binding: None, .. })
    ));
}

#[test]
fn duplicate_captures_are_reported() {
    let mut tree = build(CLOSURES);
    ClosureCapture::new().run(&mut tree).expect("capture");
    let add = function_named(&tree, "main$closure$0");
    tree.set_captures(add, vec!["base".to_string(), "base".to_string()])
        .expect("captures");

    let mut resolution = LocalResolution::new();
    resolution.run(&mut tree).expect("resolve");
    let messages: Vec<String> = resolution.take_diagnostics().iter().map(|d| d.message()).collect();
    assert!(
        messages.iter().any(|m| m == "Capture 'base' is listed more than once."),
        "{:?}",
        messages
    );
}

#[test]
fn missing_main_is_only_a_warning() {
    let mut tree = build("module lib\nfunction helper = |a| { return a }\n");
    let diagnostics = run_passes(&mut tree, &CompileOptions::default()).expect("passes");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].level(), Level::Warning);
    assert!(!diagnostics[0].is_error());
}

#[test]
fn disabled_passes_leave_the_tree_alone() {
    let mut tree = build(CASES);
    let options = CompileOptions {
        expand_cases: false,
        ..CompileOptions::default()
    };
    run_passes(&mut tree, &options).expect("passes");
    assert_eq!(find(&tree, "CaseStatement").len(), 1);
}
