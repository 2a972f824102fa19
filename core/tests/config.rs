use std::io::Write;

use tempfile::NamedTempFile;
use trellis_core::{CompileOptions, TrellisErrorExt};

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn empty_object_enables_every_pass() {
    let file = config_file("{}");
    let options = CompileOptions::load_from_file(file.path()).expect("load");
    assert_eq!(options, CompileOptions::default());
}

#[test]
fn fields_override_defaults() {
    let file = config_file(r#"{ "expand_cases": false, "expand_matches": false }"#);
    let options = CompileOptions::load_from_file(file.path()).expect("load");
    assert!(!options.expand_cases);
    assert!(!options.expand_matches);
    assert!(options.resolve_locals);
    assert!(options.emit_bytecode);
}

#[test]
fn dependent_stages_must_stay_enabled() {
    let file = config_file(r#"{ "resolve_locals": false }"#);
    let err = CompileOptions::load_from_file(file.path()).err().expect("rejected");
    assert!(err.message().contains("emit_bytecode requires resolve_locals"));

    let file = config_file(r#"{ "capture_closures": false, "resolve_locals": false, "emit_bytecode": false }"#);
    let options = CompileOptions::load_from_file(file.path()).expect("front end only");
    assert!(!options.capture_closures);
}

#[test]
fn malformed_json_names_the_file() {
    let file = config_file("{ expand_cases: nope }");
    let err = CompileOptions::load_from_file(file.path()).err().expect("parse error");
    assert_eq!(err.issuer(), "trellis.config");
    assert!(err.message().starts_with("parse config"));
    let location = err.location().expect("location");
    assert_eq!(location.file, file.path().display().to_string());
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = CompileOptions::load_from_file(dir.path().join("trellis.json")).err();
    assert!(err.is_some());
}
