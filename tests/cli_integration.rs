// CLI integration tests: exit codes, stdout JSON and error envelopes.
mod common;

use std::process::Command;

use common::{FakeBoard, TestResult};
use serde_json::{Value, json};

const UNREACHABLE: &str = "127.0.0.1:1";

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_bbtyped");
    let mut command = Command::new(exe);
    command.env_remove("BB_GATEWAY_ADDR").env_remove("RUST_LOG");
    command
}

fn parse_json(value: &str) -> Value {
    serde_json::from_str(value).expect("valid json")
}

fn parse_json_line(output: &[u8]) -> Value {
    let text = String::from_utf8_lossy(output);
    let line = text.lines().next().expect("json line");
    parse_json(line)
}

#[test]
fn version_needs_no_board() {
    let output = cmd()
        .args(["--addr", "not a url at all", "version"])
        .output()
        .expect("version");
    assert!(output.status.success());
    let value = parse_json_line(&output.stdout);
    assert_eq!(value["name"], "bbtyped");
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn empty_array_exit_code() {
    let output = cmd()
        .args(["--addr", UNREACHABLE, "post", "x", "t", "[]"])
        .output()
        .expect("post");
    assert_eq!(output.status.code(), Some(3));
    let err = parse_json_line(&output.stderr);
    assert_eq!(err["error"]["kind"], "EmptyArray");
    assert_eq!(err["error"]["message"], "array size cannot be zero");
}

#[test]
fn unsupported_value_exit_code() {
    let output = cmd()
        .args(["--addr", UNREACHABLE, "post", "x", "t", "[null, 1]"])
        .output()
        .expect("post");
    assert_eq!(output.status.code(), Some(4));
    let err = parse_json_line(&output.stderr);
    assert_eq!(err["error"]["kind"], "UnsupportedType");
}

#[test]
fn invalid_json_is_usage_error() {
    let output = cmd()
        .args(["--addr", UNREACHABLE, "post", "x", "t", "[1,"])
        .output()
        .expect("post");
    assert_eq!(output.status.code(), Some(2));
    let err = parse_json_line(&output.stderr);
    assert_eq!(err["error"]["kind"], "Usage");
    assert!(err["error"]["hint"].is_string());
}

#[test]
fn missing_subcommand_argument_is_usage_error() {
    let output = cmd().args(["post", "x"]).output().expect("post");
    assert_eq!(output.status.code(), Some(2));
    let err = parse_json_line(&output.stderr);
    assert_eq!(err["error"]["kind"], "Usage");
}

#[test]
fn unreachable_board_exit_code() {
    let output = cmd()
        .args(["--addr", UNREACHABLE, "status"])
        .output()
        .expect("status");
    assert_eq!(output.status.code(), Some(8));
    let err = parse_json_line(&output.stderr);
    assert_eq!(err["error"]["kind"], "Io");
    assert!(err["error"]["causes"].is_array());
}

#[test]
fn post_sends_classified_value() -> TestResult<()> {
    let board = FakeBoard::start(vec![(200, json!({ "ok": true }))])?;
    let output = cmd()
        .args(["--addr", &board.addr(), "post", "x", "run1", "[1.5, 2]"])
        .output()?;
    assert!(output.status.success());
    assert_eq!(
        parse_json_line(&output.stdout),
        json!({ "posted": { "title": "x", "tag": "run1" } })
    );

    let requests = board.finish();
    assert_eq!(
        requests[0].json()["value"],
        json!({ "type": "real_array", "data": [1.5, 2.0], "shape": [2] })
    );
    Ok(())
}

#[test]
fn mixed_list_posts_promoted_real_array() -> TestResult<()> {
    let board = FakeBoard::start(vec![(200, json!({ "ok": true }))])?;
    let output = cmd()
        .args(["--addr", &board.addr(), "post", "x", "t", "[1, 2.7, 3]"])
        .output()?;
    assert!(output.status.success());

    let requests = board.finish();
    assert_eq!(
        requests[0].json()["value"],
        json!({ "type": "real_array", "data": [1.0, 2.7, 3.0], "shape": [3] })
    );
    Ok(())
}

#[test]
fn status_output_keeps_label_order() -> TestResult<()> {
    let board = FakeBoard::start(vec![(200, json!({ "status": [100, 50, 50.0, 3, 2, 1] }))])?;
    let output = cmd().args(["--addr", &board.addr(), "status"]).output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        r#"{"datasize":100,"memory_used":50,"memory_used(%)":50.0,"bulletins":3,"files":2,"archived":1}"#
    );
    board.finish();
    Ok(())
}

#[test]
fn read_uses_gateway_env_and_prints_nested_lists() -> TestResult<()> {
    let board = FakeBoard::start(vec![(
        200,
        json!({ "entries": [{ "type": "integer_array", "data": [1, 2, 3, 4], "shape": [2, 2] }] }),
    )])?;
    let output = cmd()
        .env("BB_GATEWAY_ADDR", board.addr())
        .args(["read", "x", "--tag", "run1"])
        .output()?;
    assert!(output.status.success());
    assert_eq!(parse_json_line(&output.stdout), json!([[1, 2], [3, 4]]));

    let requests = board.finish();
    assert_eq!(
        requests[0].json(),
        json!({ "title": "x", "tag": "run1", "revisions": [] })
    );
    Ok(())
}

#[test]
fn ambiguous_title_exit_code_and_hint() -> TestResult<()> {
    let board = FakeBoard::start(vec![(
        409,
        json!({ "error": { "kind": "NotUnique", "message": "multiple data found: a, b" } }),
    )])?;
    let output = cmd()
        .args(["--addr", &board.addr(), "read", "x"])
        .output()?;
    assert_eq!(output.status.code(), Some(6));
    assert_eq!(String::from_utf8_lossy(&output.stderr).lines().count(), 1);
    let err = parse_json_line(&output.stderr);
    assert_eq!(err["error"]["kind"], "NotUnique");
    assert_eq!(err["error"]["title"], "x");
    assert!(
        err["error"]["hint"]
            .as_str()
            .is_some_and(|hint| hint.contains("--tag"))
    );
    board.finish();
    Ok(())
}

#[test]
fn relabel_without_target_is_usage_error() {
    let output = cmd()
        .args(["--addr", UNREACHABLE, "relabel", "x"])
        .output()
        .expect("relabel");
    assert_eq!(output.status.code(), Some(2));
}
