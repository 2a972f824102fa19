use trellis_core::codegen::{self, Op, Program};
use trellis_core::ir::{build_ir, Value};
use trellis_core::{compile_source, parse_source, CompileOptions, SourceFile, TrellisErrorExt};

fn compile_with(source: &str, options: &CompileOptions) -> Program {
    let compilation =
        compile_source(&SourceFile::from_string("codegen.trl", source), options).expect("compile");
    assert!(!compilation.has_errors(), "{:?}", compilation.diagnostics);
    compilation.program.expect("program")
}

fn compile(source: &str) -> Program {
    compile_with(source, &CompileOptions::default())
}

fn assert_branches_in_bounds(program: &Program) {
    for function in &program.functions {
        for op in &function.code {
            if let Some(target) = op.branch_target() {
                assert!(target <= function.code.len(), "{} in {}", op, function.name);
            }
        }
    }
}

#[test]
fn while_loop_patches_both_branches() {
    let program = compile(
        "module demo\nfunction main = || {\n    var total = 0\n    var i = 0\n    while i < 3 {\n        total = total + i\n        i = i + 1\n    }\n    return total\n}\n",
    );
    assert_eq!(program.module, "demo");
    let main = program.function("main").expect("main");
    assert_eq!(main.arity, 0);
    assert_eq!(main.locals, 2);
    assert_eq!(
        main.code,
        vec![
            Op::Const { value: Value::Int(0) },
            Op::Store { slot: 0 },
            Op::Const { value: Value::Int(0) },
            Op::Store { slot: 1 },
            Op::Load { slot: 1 },
            Op::Const { value: Value::Int(3) },
            Op::Lt,
            Op::BrFalse { target: 17 },
            Op::Load { slot: 0 },
            Op::Load { slot: 1 },
            Op::Add,
            Op::Store { slot: 0 },
            Op::Load { slot: 1 },
            Op::Const { value: Value::Int(1) },
            Op::Add,
            Op::Store { slot: 1 },
            Op::Jump { target: 4 },
            Op::Load { slot: 0 },
            Op::Ret,
            Op::Const { value: Value::Null },
            Op::Ret,
        ]
    );
}

#[test]
fn logical_operators_short_circuit() {
    let program = compile("module demo\nfunction main = || { }\nfunction both = |a, b| { return a and b }\n");
    let both = program.function("both").expect("both");
    assert_eq!(both.arity, 2);
    assert_eq!(
        both.code[..6],
        [
            Op::Load { slot: 0 },
            Op::Dup,
            Op::BrFalse { target: 5 },
            Op::Pop,
            Op::Load { slot: 1 },
            Op::Ret,
        ]
    );
}

#[test]
fn expression_statements_discard_their_value() {
    let program = compile("module demo\nfunction main = || {\n    print(\"hi\")\n}\n");
    let main = program.function("main").expect("main");
    assert_eq!(
        main.code,
        vec![
            Op::Const {
                value: Value::Str("hi".to_string())
            },
            Op::CallBuiltin {
                name: "print".to_string(),
                argc: 1
            },
            Op::Pop,
            Op::Const { value: Value::Null },
            Op::Ret,
        ]
    );
}

#[test]
fn closures_are_lifted_with_their_captures() {
    let program = compile(
        "module demo\nfunction main = || {\n    let base = 10\n    let add = |a| -> a + base\n    return add(1)\n}\n",
    );
    let main = program.function("main").expect("main");
    assert_eq!(
        main.code[..7],
        [
            Op::Const { value: Value::Int(10) },
            Op::Store { slot: 0 },
            Op::MakeClosure {
                function: "main$closure$0".to_string(),
                captures: vec![0]
            },
            Op::Store { slot: 1 },
            Op::Const { value: Value::Int(1) },
            Op::CallClosure { slot: 1, argc: 1 },
            Op::Ret,
        ]
    );

    let add = program.function("main$closure$0").expect("closure");
    assert_eq!((add.arity, add.captures, add.locals), (1, 1, 2));
    assert_eq!(add.code[..4], [Op::Load { slot: 1 }, Op::Load { slot: 0 }, Op::Add, Op::Ret]);
}

const BRANCHY: &str = r#"module demo

function main = |x| {
    case {
        when x > 0 { print("positive") }
        when x < 0 { print("negative") }
        otherwise { print("zero") }
    }
    let size = match { when x > 100 then "big" otherwise "small" }
    return size
}
"#;

#[test]
fn expanded_and_direct_alternatives_both_compile() {
    let expanded = compile(BRANCHY);
    assert_branches_in_bounds(&expanded);

    let options = CompileOptions {
        expand_matches: false,
        expand_cases: false,
        ..CompileOptions::default()
    };
    let direct = compile_with(BRANCHY, &options);
    assert_branches_in_bounds(&direct);

    let main = direct.function("main").expect("main");
    let guards = main.code.iter().filter(|op| matches!(op, Op::BrFalse { .. })).count();
    assert_eq!(guards, 3);
    let printed = main
        .code
        .iter()
        .filter(|op| matches!(op, Op::CallBuiltin { name, .. } if name == "print"))
        .count();
    assert_eq!(printed, 3);
}

#[test]
fn unresolved_tree_is_rejected() {
    let unit = parse_source(&SourceFile::from_string(
        "raw.trl",
        "module demo\nfunction main = || { let x = 1\n return x }\n",
    ))
    .expect("parse");
    let tree = build_ir(&unit).expect("build");
    let err = codegen::generate(&tree).err().expect("unresolved");
    assert!(err.message().contains("never resolved"), "{}", err.message());
    assert_eq!(err.issuer(), "trellis.codegen");
}

#[test]
fn diagnostics_suppress_bytecode() {
    let compilation = compile_source(
        &SourceFile::from_string("bad.trl", "module demo\nfunction main = || { return missing }\n"),
        &CompileOptions::default(),
    )
    .expect("compile");
    assert!(compilation.has_errors());
    assert!(compilation.program.is_none());
}

#[test]
fn build_errors_abort_compilation() {
    let result = compile_source(
        &SourceFile::from_string("bad.trl", "module demo\nfunction main = || { case { when true { } } }\n"),
        &CompileOptions::default(),
    );
    let err = result.err().expect("missing fallback");
    assert!(err.message().contains("otherwise"));
}

#[test]
fn program_survives_json() {
    let program = compile(BRANCHY);
    let raw = program.to_json().expect("serialize");
    assert_eq!(Program::from_json(&raw).expect("deserialize"), program);
}
