use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_arith_interpreter"))
        .args(args)
        .output()
        .expect("failed to run arith_interpreter")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_evaluate_prints_result() {
    let output = run(&["evaluate", "2*3+1"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "7\n");
}

#[test]
fn test_division_by_zero_exits_70() {
    let output = run(&["evaluate", "8/0"]);
    assert_eq!(output.status.code(), Some(70));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_unexpected_character_exits_65() {
    let output = run(&["evaluate", "1%2"]);
    assert_eq!(output.status.code(), Some(65));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[line 1] Error: Unexpected character: %"));
}

#[test]
fn test_multibyte_character_exits_65() {
    let output = run(&["evaluate", "1+é"]);
    assert_eq!(output.status.code(), Some(65));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[line 1] Error: Unexpected character: é"));
}

#[test]
fn test_parse_error_exits_65() {
    let output = run(&["parse", "1+2+3"]);
    assert_eq!(output.status.code(), Some(65));
}

#[test]
fn test_faithful_flag() {
    let output = run(&["--mode", "faithful", "evaluate", "(1)(2)"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "3\n");
}

#[test]
fn test_tokenize_output() {
    let output = run(&["tokenize", "3*4"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout(&output),
        "LEFT_PAREN ( synthetic\n\
         INTEGER 3 3\n\
         STAR * null\n\
         INTEGER 4 4\n\
         RIGHT_PAREN ) synthetic\n\
         EOF  null\n"
    );
}

#[test]
fn test_parse_output() {
    let output = run(&["parse", "(13-4)-(12+1)"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "(- (- 13 4) (+ 12 1))\n");
}

#[test]
fn test_demo_output() {
    let output = run(&["demo"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout(&output),
        "2+3 = 5\n\
         10-4 = 6\n\
         6/2 = 3\n\
         7 = 7\n\
         (1+2) = 3\n\
         2*3+1 = 7\n\
         (13-4)-(12+1) = -4\n"
    );
}

#[test]
fn test_missing_file_fails() {
    let output = run(&["evaluate", "--file", "does/not/exist.txt"]);
    assert!(!output.status.success());
}
