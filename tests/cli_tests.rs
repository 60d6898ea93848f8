use std::process::{Command, Output};

fn lazyrt(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lazyrt"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("LAZYRT_DEPTH_LIMIT")
        .env_remove("LAZYRT_STEP_LIMIT")
        .output()
        .expect("failed to run lazyrt")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn test_upper() {
    let out = lazyrt(&["upper", "hello, world"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(stdout(&out), "HELLO, WORLD\n");
}

#[test]
fn test_echo_writes_stderr() {
    let out = lazyrt(&["echo", "x=5", "5"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "5\n");
    assert!(stderr(&out).contains("x=5\n"));
}

#[test]
fn test_error_exits_one() {
    let out = lazyrt(&["error", "boom"]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(stdout(&out), "");
    assert!(stderr(&out).contains("ERROR: boom\n"));
}

#[test]
fn test_pow() {
    let out = lazyrt(&["pow", "5", "30"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "931322574615478515625\n");
}

#[test]
fn test_max_negative_operands() {
    let out = lazyrt(&["max", "-3", "-8"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(stdout(&out), "-3\n");
}

#[test]
fn test_loop_is_a_contract_violation() {
    let out = lazyrt(&["loop"]);
    assert_eq!(out.status.code(), Some(70));
    assert!(stderr(&out).contains("infinite reduction"));
}

#[test]
fn test_spin_stops_at_step_limit() {
    let out = lazyrt(&["spin", "--step-limit", "1000"]);
    assert_eq!(out.status.code(), Some(70));
    assert!(stderr(&out).contains("step limit of 1000"));
}

#[test]
fn test_nest_stops_at_depth_limit() {
    let out = lazyrt(&["--depth-limit", "40", "nest"]);
    assert_eq!(out.status.code(), Some(70));
    assert!(stderr(&out).contains("depth limit of 40"));
}
