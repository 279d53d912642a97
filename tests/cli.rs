use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn oleander() -> Command {
    Command::cargo_bin("oleander").expect("binary exists")
}

#[test]
fn eval_prints_the_resulting_value() {
    oleander()
        .arg("eval")
        .arg("1 + 2;")
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn eval_dumps_structured_values() {
    oleander()
        .arg("eval")
        .arg(r#"[1, "a", :b];"#)
        .assert()
        .success()
        .stdout("[1, \"a\", :b]\n");
}

#[test]
fn eval_reports_syntax_errors_on_stderr() {
    oleander()
        .arg("eval")
        .arg("1 +")
        .assert()
        .failure()
        .stderr(predicate::str::contains("syntax error"));
}

#[test]
fn eval_reports_runtime_errors_with_positions() {
    oleander()
        .arg("eval")
        .arg("missing;")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<eval>:1:1"))
        .stderr(predicate::str::contains("undefined"));
}

#[test]
fn run_executes_a_script_file() {
    let dir = tempdir().expect("create temp dir");
    let script = dir.path().join("hello.ol");
    fs::write(&script, "println(\"hello from a script\");\n").expect("write script");

    oleander()
        .arg("run")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("hello from a script"));
}

#[test]
fn run_shares_state_between_scripts() {
    let dir = tempdir().expect("create temp dir");
    let first = dir.path().join("first.ol");
    let second = dir.path().join("second.ol");
    fs::write(&first, "var greeting = \"carried over\";\n").expect("write first");
    fs::write(&second, "println(greeting);\n").expect("write second");

    oleander()
        .arg("run")
        .arg(&first)
        .arg(&second)
        .assert()
        .success()
        .stdout(predicate::str::contains("carried over"));
}

#[test]
fn run_computes_a_hypotenuse() {
    let dir = tempdir().expect("create temp dir");
    let script = dir.path().join("pythagoras.ol");
    fs::write(
        &script,
        "var a = 3;\nvar b = 4;\nprintln(sqrt(a * a + b * b));\n",
    )
    .expect("write script");

    oleander()
        .arg("run")
        .arg(&script)
        .assert()
        .success()
        .stdout("5\n");
}

#[test]
fn run_fails_for_a_missing_file() {
    oleander()
        .arg("run")
        .arg("no/such/script.ol")
        .assert()
        .failure();
}

#[test]
fn print_renders_strings_raw_and_dumps_the_rest() {
    let dir = tempdir().expect("create temp dir");
    let script = dir.path().join("print.ol");
    fs::write(&script, "println(\"text\", 1 + 1, :atom, [1, \"s\"]);\n").expect("write script");

    oleander()
        .arg("run")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("text 2 :atom [1, \"s\"]"));
}
