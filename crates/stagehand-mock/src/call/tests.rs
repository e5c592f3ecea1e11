//! Unit tests for the expected-call builder.

use serde_json::json;

use super::*;
use crate::json::JsonKey;

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn new_records_method_and_status() {
    let call = ExpectedCall::new("POST", 201);
    assert_eq!(call.method(), "POST");
    assert_eq!(call.status(), 201);
}

#[test]
#[should_panic(expected = "upper-case")]
fn lower_case_method_is_rejected() {
    let _ = ExpectedCall::new("get", 200);
}

// ---------------------------------------------------------------------------
// Result and error bodies
// ---------------------------------------------------------------------------

#[test]
fn result_str_stores_bytes() {
    let call = ExpectedCall::new("GET", 200).result_str("hello");
    assert_eq!(call.body.as_deref(), Some(b"hello".as_slice()));
}

#[test]
fn result_json_serialises_value() {
    let call = ExpectedCall::new("GET", 200).result_json(&json!({"ok": true}));
    assert_eq!(call.body.as_deref(), Some(br#"{"ok":true}"#.as_slice()));
}

#[test]
#[should_panic(expected = "error body must not be given")]
fn error_body_conflicts_with_result() {
    let _ = ExpectedCall::new("GET", 500)
        .result_str("hello")
        .error_with_body("boom", b"details".to_vec());
}

#[test]
#[should_panic(expected = "result must not be given")]
fn result_conflicts_with_error_body() {
    let _ = ExpectedCall::new("GET", 500)
        .error_with_body("boom", b"details".to_vec())
        .result_str("hello");
}

#[test]
fn error_without_body_allows_nothing_else() {
    let call = ExpectedCall::new("GET", 500).error("boom");
    let error = call.error.as_ref().expect("error data");
    assert_eq!(error.msg, "boom");
    assert!(error.body.is_none());
}

// ---------------------------------------------------------------------------
// Form/JSON exclusivity
// ---------------------------------------------------------------------------

#[test]
#[should_panic(expected = "must not be mixed")]
fn json_after_form_panics() {
    let _ = ExpectedCall::new("POST", 200)
        .expect_form_present("user")
        .expect_json_present(vec![JsonKey::from("user")]);
}

#[test]
#[should_panic(expected = "must not be mixed")]
fn form_after_json_panics() {
    let _ = ExpectedCall::new("POST", 200)
        .expect_json_value(vec![JsonKey::from("user")], json!("jane"))
        .expect_form_value("user", "jane");
}

#[test]
fn form_expectations_accumulate() {
    let call = ExpectedCall::new("POST", 200)
        .expect_form_present("a")
        .expect_form_value("b", "1")
        .expect_form_value_absent("c");
    let Some(BodyExpectations::Form(form)) = &call.body_expectations else {
        panic!("expected form expectations");
    };
    assert!(form.present.contains("a"));
    assert_eq!(form.values.get("b"), Some(&vec!["1".into()]));
    assert_eq!(form.values.get("c"), Some(&Vec::new()));
}
