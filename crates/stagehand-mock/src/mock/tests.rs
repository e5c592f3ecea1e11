//! Unit tests for the mock client queue.

use serde_json::json;

use super::*;
use crate::client::HttpError;

fn get(url: &str) -> HttpRequest {
    HttpRequest::new("GET", url)
}

// ---------------------------------------------------------------------------
// Sequencing
// ---------------------------------------------------------------------------

#[test]
fn calls_are_matched_in_order() {
    let mut client = MockClient::new(vec![
        ExpectedCall::new("GET", 200)
            .result_str("first")
            .expect_url("https://host/one"),
        ExpectedCall::new("GET", 404)
            .result_str("second")
            .expect_url("https://host/two"),
    ]);

    let first = client.call(get("https://host/one")).expect("first call");
    assert_eq!(first.status, 200);
    assert_eq!(first.body, b"first");

    let second = client.call(get("https://host/two")).expect("second call");
    assert_eq!(second.status, 404);

    client.verify();
}

#[test]
#[should_panic(expected = "got more calls than expected")]
fn extra_call_panics() {
    let mut client = MockClient::new(Vec::new());
    let _ = client.call(get("https://host/one"));
}

#[test]
#[should_panic(expected = "got fewer calls than expected (1 of 2)")]
fn verify_rejects_unconsumed_expectations() {
    let mut client = MockClient::new(vec![
        ExpectedCall::new("GET", 200),
        ExpectedCall::new("GET", 200),
    ]);
    let _ = client.call(get("https://host/one")).expect("first call");
    client.verify();
}

#[test]
#[should_panic(expected = "unconsumed; call verify()")]
fn dropping_unverified_mock_panics() {
    let client = MockClient::new(vec![ExpectedCall::new("GET", 200)]);
    drop(client);
}

#[test]
#[should_panic(expected = "call 1 invalid")]
fn mismatch_panics_with_call_number() {
    let mut client = MockClient::new(vec![
        ExpectedCall::new("POST", 200).expect_url("https://host/one"),
    ]);
    let _ = client.call(get("https://host/one"));
}

// ---------------------------------------------------------------------------
// Canned responses
// ---------------------------------------------------------------------------

#[test]
fn response_headers_are_lowercased() {
    let mut client = MockClient::new(vec![
        ExpectedCall::new("GET", 200)
            .result_str("ok")
            .return_header("Content-Type", "text/plain"),
    ]);
    let response = client.call(get("https://host/one")).expect("call");
    assert_eq!(
        response.headers.get("content-type").map(String::as_str),
        Some("text/plain")
    );
    client.verify();
}

#[test]
fn response_echoes_request_url() {
    let mut client = MockClient::new(vec![ExpectedCall::new("GET", 200).result_str("ok")]);
    let response = client.call(get("https://host/one?a=b")).expect("call");
    assert_eq!(response.url, "https://host/one?a=b");
    client.verify();
}

#[test]
fn json_result_round_trips() {
    let mut client = MockClient::new(vec![
        ExpectedCall::new("GET", 200).result_json(&json!({"ok": true})),
    ]);
    let response = client.call(get("https://host/one")).expect("call");
    let value: serde_json::Value = serde_json::from_slice(&response.body).expect("json body");
    assert_eq!(value, json!({"ok": true}));
    client.verify();
}

// ---------------------------------------------------------------------------
// Canned errors
// ---------------------------------------------------------------------------

#[test]
fn error_produces_status_error_with_body() {
    let mut client = MockClient::new(vec![
        ExpectedCall::new("GET", 500)
            .error_with_body("internal error", b"details".to_vec())
            .return_header("Content-Type", "text/plain"),
    ]);
    let err = client.call(get("https://host/one")).expect_err("error");
    let HttpError::Status {
        status,
        msg,
        headers,
        body,
    } = err
    else {
        panic!("expected status error");
    };
    assert_eq!(status, 500);
    assert_eq!(msg, "internal error");
    assert_eq!(headers.get("content-type").map(String::as_str), Some("text/plain"));
    assert_eq!(body, b"details");
    client.verify();
}

#[test]
fn error_without_body_yields_empty_body() {
    let mut client = MockClient::new(vec![ExpectedCall::new("GET", 404).error("not found")]);
    let err = client.call(get("https://host/one")).expect_err("error");
    let HttpError::Status { status, body, .. } = err else {
        panic!("expected status error");
    };
    assert_eq!(status, 404);
    assert!(body.is_empty());
    client.verify();
}

#[test]
fn transport_error_is_returned_as_is() {
    let mut client = MockClient::new(vec![
        ExpectedCall::new("GET", 0).transport_error("connection refused"),
    ]);
    let err = client.call(get("https://host/one")).expect_err("error");
    assert_eq!(
        err,
        HttpError::Transport {
            msg: "connection refused".into()
        }
    );
    client.verify();
}
