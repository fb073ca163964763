//! End-to-end tests of the `minic` binary

use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

fn minic(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_minic"))
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .unwrap()
}

fn write_source(dir: &TempDir, name: &str, source: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, source).unwrap();
    path.display().to_string()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

#[test]
fn test_valid_program_prints_ir() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "sum.mc", "int x = 2; print(x + 3);\n");

    let output = minic(&[&file]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));

    let ir = stdout(&output);
    assert!(ir.contains("declare i32 @print(i32)"));
    assert!(ir.contains("define i32 @main()"));
    assert!(ir.contains("%0 = add i32 2, 3"));
    assert!(ir.contains("ret i32 0"));
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.mc");

    let output = minic(&[&missing.display().to_string()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("failed to read"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_parse_error() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "bad.mc", "int x = ;\n");

    let output = minic(&[&file]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("unexpected `;`"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_resolution_error() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "unbound.mc", "int x = 1;\nreturn y;\n");

    let output = minic(&[&file]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("name resolution failed"));
    assert!(err.contains("cannot find `y`"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_emit_ast() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "ast.mc", "int x=1;if(x<2){x=(x+1)*2;}return x;");

    let output = minic(&[&file, "--emit", "ast"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout(&output),
        "int x = 1;\nif (x < 2) {\n    x = (x + 1) * 2;\n}\nreturn x;\n"
    );
}

#[test]
fn test_emit_ast_json() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "json.mc", "return 7;");

    let output = minic(&[&file, "--emit", "ast-json"]);
    assert_eq!(output.status.code(), Some(0));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert!(json.is_object());
    assert!(stdout(&output).contains('7'));
}

#[test]
fn test_extra_extern() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "max.mc", "return max(1, 2);");

    let rejected = minic(&[&file]);
    assert_eq!(rejected.status.code(), Some(1));

    let output = minic(&[&file, "--extern", "max:2"]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(stdout(&output).contains("declare i32 @max(i32, i32)"));
}

#[test]
fn test_extern_overrides_default_print() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "print2.mc", "print(1, 2);");

    let output = minic(&[&file, "--extern", "print:2"]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert!(stdout(&output).contains("declare i32 @print(i32, i32)"));
}

#[test]
fn test_no_default_externs() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "print.mc", "print(1);");

    let output = minic(&[&file, "--no-default-externs"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("cannot find `print`"));
}

#[test]
fn test_bad_arguments() {
    let bad_extern = minic(&["whatever.mc", "--extern", "max"]);
    assert_eq!(bad_extern.status.code(), Some(1));
    assert!(stderr(&bad_extern).contains("NAME:ARITY"));

    let no_file = minic(&[]);
    assert_eq!(no_file.status.code(), Some(1));

    let help = minic(&["--help"]);
    assert_eq!(help.status.code(), Some(0));
    assert!(stdout(&help).contains("--emit"));
}
