use assert_cmd::Command;

fn lox(fixture: &str) -> Command {
    let mut cmd = Command::cargo_bin("lox").unwrap();
    cmd.arg(format!("tests/fixtures/{fixture}"));
    cmd
}

#[test]
fn arithmetic_and_string_concatenation() {
    lox("arithmetic.lox").assert().success().stdout("7\n9\n2.5\nabc\n");
}

#[test]
fn block_scoping_and_for_loops() {
    lox("scoping.lox").assert().success().stdout("inner\nglobal\n3\n");
}

#[test]
fn closures_keep_their_own_state() {
    lox("closures.lox").assert().success().stdout("1\n2\n3\n");
}

#[test]
fn classes_support_inheritance_and_super() {
    lox("classes.lox")
        .assert()
        .success()
        .stdout("Rex makes a sound.\nRex barks.\n");
}

#[test]
fn passing_assertion_does_not_halt_execution() {
    lox("assert_pass.lox").assert().success().stdout("ok\n");
}

#[test]
fn failing_assertion_halts_with_exit_code_70() {
    lox("assert_fail.lox").assert().code(70).stdout("before\n");
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    lox("runtime_error.lox").assert().code(70).stdout("before\n");
}

#[test]
fn syntax_error_exits_with_code_65() {
    lox("parse_error.lox").assert().code(65).stdout("");
}

#[test]
fn usage_message_on_too_many_arguments() {
    Command::cargo_bin("lox")
        .unwrap()
        .arg("a.lox")
        .arg("b.lox")
        .assert()
        .code(64)
        .stdout("Usage: lox [script]\n");
}
