//! Purpose: End-to-end tests for `BoardClient` over `GatewayTransport`.
//! Exports: None (integration test module).
//! Role: Validate wire payloads, reconstruction and error propagation across TCP.
//! Invariants: Uses a loopback fake board; no external services.

mod common;

use bbtyped::api::{
    BoardClient, BoardListing, BoardStatus, BulletinListing, Complex, ErrorKind, NdArray,
    GatewayTransport, Revisions, Value,
};
use common::{FakeBoard, TestResult};
use serde_json::json;

fn client_for(board: &FakeBoard) -> TestResult<BoardClient<GatewayTransport>> {
    Ok(BoardClient::new(GatewayTransport::new(board.addr())?))
}

#[test]
fn nested_list_posts_as_shaped_integer_array() -> TestResult<()> {
    let board = FakeBoard::start(vec![(200, json!({ "ok": true }))])?;
    let client = client_for(&board)?;

    client.post("x", "run1", vec![vec![1i64, 2, 3], vec![4, 5, 6]])?;

    let requests = board.finish();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/v0/post");
    assert_eq!(
        requests[0].json(),
        json!({
            "title": "x",
            "tag": "run1",
            "value": { "type": "integer_array", "data": [1, 2, 3, 4, 5, 6], "shape": [2, 3] }
        })
    );
    Ok(())
}

#[test]
fn complex_scalar_posts_re_im_pair() -> TestResult<()> {
    let board = FakeBoard::start(vec![(200, json!({ "ok": true }))])?;
    let client = client_for(&board)?;

    client.post("z", "t", Complex::new(1.0, -2.0))?;

    let requests = board.finish();
    assert_eq!(
        requests[0].json()["value"],
        json!({ "type": "complex", "value": { "re": 1.0, "im": -2.0 } })
    );
    Ok(())
}

#[test]
fn empty_array_never_reaches_the_board() -> TestResult<()> {
    let board = FakeBoard::start(Vec::new())?;
    let client = client_for(&board)?;

    let err = client
        .post("x", "t", Value::List(Vec::new()))
        .expect_err("empty array");
    assert_eq!(err.kind(), ErrorKind::EmptyArray);
    assert!(board.finish().is_empty());
    Ok(())
}

#[test]
fn single_entry_read_is_reshaped_and_unwrapped() -> TestResult<()> {
    let board = FakeBoard::start(vec![(
        200,
        json!({
            "entries": [
                { "type": "real_array", "data": [1.0, 2.0, 3.0, 4.0], "shape": [2, 2] }
            ]
        }),
    )])?;
    let client = client_for(&board)?;

    let read = client.read("x", None, &[])?;

    let expected = NdArray::new(
        vec![2, 2],
        vec![
            Value::Real(1.0),
            Value::Real(2.0),
            Value::Real(3.0),
            Value::Real(4.0),
        ],
    )?;
    assert_eq!(read, Revisions::One(Value::Array(expected)));

    let requests = board.finish();
    assert_eq!(requests[0].path, "/v0/read");
    assert_eq!(
        requests[0].json(),
        json!({ "title": "x", "tag": null, "revisions": [] })
    );
    Ok(())
}

#[test]
fn multi_revision_read_keeps_request_order() -> TestResult<()> {
    let board = FakeBoard::start(vec![(
        200,
        json!({
            "entries": [
                { "type": "string", "value": "late" },
                { "type": "integer", "value": 7 }
            ]
        }),
    )])?;
    let client = client_for(&board)?;

    let read = client.read("x", Some("run1"), &[2, 0])?;

    assert_eq!(
        read,
        Revisions::Many(vec![Value::String("late".into()), Value::Integer(7)])
    );
    let requests = board.finish();
    assert_eq!(requests[0].json()["revisions"], json!([2, 0]));
    assert_eq!(requests[0].json()["tag"], json!("run1"));
    Ok(())
}

#[test]
fn status_board_and_info_get_labels() -> TestResult<()> {
    let board = FakeBoard::start(vec![
        (200, json!({ "status": [100, 50, 50.0, 3, 2, 1] })),
        (200, json!({ "board": [["x", "run1", 2]] })),
        (
            200,
            json!({ "revisions": [[0, 48, "2026-01-01T00:00:00Z", "memory"]] }),
        ),
    ])?;
    let client = client_for(&board)?;

    let status = client.status()?;
    let listings = client.view_board()?;
    let info = client.get_info("x", None)?;

    assert_eq!(
        status,
        BoardStatus {
            datasize: 100,
            memory_used: 50,
            memory_used_percent: 50.0,
            bulletins: 3,
            files: 2,
            archived: 1,
        }
    );
    assert_eq!(
        listings,
        vec![BoardListing {
            title: "x".into(),
            tag: "run1".into(),
            revisions: 2,
        }]
    );
    assert_eq!(info[0].backend, "memory");
    assert_eq!(
        serde_json::to_value(&info[0])?,
        serde_json::to_value(BulletinListing {
            revision: 0,
            datasize: 48,
            timestamp: "2026-01-01T00:00:00Z".into(),
            backend: "memory".into(),
        })?
    );

    let requests = board.finish();
    let routes: Vec<_> = requests
        .iter()
        .map(|req| format!("{} {}", req.method, req.path))
        .collect();
    assert_eq!(routes, ["GET /v0/status", "GET /v0/board", "POST /v0/info"]);
    Ok(())
}

#[test]
fn ambiguous_tag_surfaces_not_unique() -> TestResult<()> {
    let board = FakeBoard::start(vec![(
        409,
        json!({
            "error": {
                "kind": "NotUnique",
                "message": "multiple data found: a, b",
                "title": "x"
            }
        }),
    )])?;
    let client = client_for(&board)?;

    let err = client.read("x", None, &[]).expect_err("ambiguous");
    assert_eq!(err.kind(), ErrorKind::NotUnique);
    assert_eq!(err.message(), Some("multiple data found: a, b"));
    assert_eq!(err.title(), Some("x"));
    board.finish();
    Ok(())
}

#[test]
fn missing_revision_surfaces_not_found() -> TestResult<()> {
    let board = FakeBoard::start(vec![(
        404,
        json!({ "error": { "kind": "NotFound", "message": "revision not found", "revision": 9 } }),
    )])?;
    let client = client_for(&board)?;

    let err = client.read("x", Some("t"), &[9]).expect_err("missing");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.revision(), Some(9));
    assert_eq!(err.tag(), Some("t"));
    board.finish();
    Ok(())
}

#[test]
fn bare_status_code_maps_to_kind() -> TestResult<()> {
    let board = FakeBoard::start(vec![(403, json!("forbidden"))])?;
    let client = client_for(&board)?;

    let err = client.status().expect_err("forbidden");
    assert_eq!(err.kind(), ErrorKind::Permission);
    board.finish();
    Ok(())
}

#[test]
fn token_is_sent_as_bearer_header() -> TestResult<()> {
    let board = FakeBoard::start(vec![(200, json!({ "version": "1.4.0" }))])?;
    let transport = GatewayTransport::new(board.addr())?.with_token("secret");
    let client = BoardClient::new(transport);

    assert_eq!(client.server_version()?, "1.4.0");

    let requests = board.finish();
    assert_eq!(requests[0].header("authorization"), Some("Bearer secret"));
    Ok(())
}

#[test]
fn admin_calls_use_their_routes() -> TestResult<()> {
    let ack = || (200, json!({ "ok": true }));
    let board = FakeBoard::start(vec![
        ack(),
        ack(),
        (200, json!({ "archives": ["a1", "a2"] })),
        (200, json!({ "log": "line one\n" })),
    ])?;
    let client = client_for(&board)?;

    client.relabel("x", Some("t"), Some("y"), None)?;
    client.clear_revisions("y", None, &[0, 1])?;
    assert_eq!(client.list_archive()?, ["a1", "a2"]);
    assert_eq!(client.log()?, "line one\n");

    let requests = board.finish();
    assert_eq!(requests[0].path, "/v0/relabel");
    assert_eq!(
        requests[0].json(),
        json!({ "title_from": "x", "tag_from": "t", "title_to": "y", "tag_to": null })
    );
    assert_eq!(requests[1].path, "/v0/clear_revisions");
    assert_eq!(requests[1].json()["revisions"], json!([0, 1]));
    assert_eq!(requests[2].path, "/v0/archives");
    assert_eq!(requests[3].path, "/v0/log");
    Ok(())
}

#[test]
fn unreachable_board_is_io_error() -> TestResult<()> {
    let client = BoardClient::new(GatewayTransport::new("127.0.0.1:1")?);
    let err = client.status().expect_err("nothing listens on port 1");
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.hint().is_some());
    Ok(())
}
