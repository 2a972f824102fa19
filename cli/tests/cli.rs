use std::fs;
use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

const GOOD: &str = r#"module demo

function main = || {
    let x = 3
    case {
        when x > 0 { print("positive") }
        otherwise { print("other") }
    }
}
"#;

const BAD: &str = "module demo\nfunction main = || {\n    print(missing)\n}\n";

fn write_source(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write source");
    path
}

fn trellis() -> Command {
    Command::cargo_bin("trellis").expect("trellis binary")
}

#[test]
fn build_writes_program_json() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_source(&dir, "good.trl", GOOD);
    let out = dir.path().join("good.json");

    trellis()
        .arg("build")
        .arg(&source)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let raw = fs::read_to_string(&out).expect("program written");
    let json: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    assert_eq!(json["module"], "demo");
    assert_eq!(json["functions"][0]["name"], "main");
}

#[test]
fn check_fails_on_undeclared_variable() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_source(&dir, "bad.trl", BAD);

    let output = trellis().arg("check").arg(&source).output().expect("run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Undeclared variable 'missing'."), "{}", stderr);
}

#[test]
fn build_reports_missing_fallback() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_source(
        &dir,
        "nofallback.trl",
        "module demo\nfunction main = || {\n    case { when true { print(1) } }\n}\n",
    );
    let output = trellis().arg("build").arg(&source).output().expect("run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("has no 'otherwise' branch"), "{}", stderr);
}

#[test]
fn dump_bytecode_prints_disassembly() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_source(&dir, "good.trl", GOOD);
    let output = trellis()
        .args(["build", "--dump", "bytecode"])
        .arg(&source)
        .output()
        .expect("run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("function main"), "{}", stdout);
    assert!(stdout.contains("BrFalse L"), "{}", stdout);
}

#[test]
fn config_beside_source_is_picked_up() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_source(&dir, "good.trl", GOOD);
    fs::write(dir.path().join("trellis.json"), r#"{ "expand_cases": false }"#).expect("config");

    let output = trellis()
        .args(["build", "--dump", "ir"])
        .arg(&source)
        .output()
        .expect("run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("CaseStatement"), "{}", stdout);
}

#[test]
fn invalid_config_is_reported() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_source(&dir, "good.trl", GOOD);
    let config = dir.path().join("custom.json");
    fs::write(&config, r#"{ "capture_closures": false }"#).expect("config");

    let output = trellis()
        .arg("check")
        .arg(&source)
        .arg("--config")
        .arg(Path::new(&config))
        .output()
        .expect("run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("resolve_locals requires capture_closures"), "{}", stderr);
}

#[test]
fn verbose_flag_forwards_compiler_logs() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_source(&dir, "verbose.trl", GOOD);

    let output = trellis().arg("-vv").arg("check").arg(&source).output().expect("run");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("module 'demo'"), "{}", stderr);

    let quiet = trellis().arg("check").arg(&source).env_remove("RUST_LOG").output().expect("run");
    let stderr = String::from_utf8_lossy(&quiet.stderr);
    assert!(!stderr.contains("module 'demo'"), "{}", stderr);
}
