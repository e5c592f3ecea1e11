//! Unit tests for JSON path descent.

use rstest::rstest;
use serde_json::{Value, json};

use super::*;

fn path(keys: &[JsonKey]) -> Vec<JsonKey> {
    keys.to_vec()
}

// ---------------------------------------------------------------------------
// format_path
// ---------------------------------------------------------------------------

#[rstest]
#[case::single_field(vec![JsonKey::from("a")], "a")]
#[case::nested_fields(vec![JsonKey::from("a"), JsonKey::from("b")], "a.b")]
#[case::leading_index(vec![JsonKey::from(0), JsonKey::from("a")], "[0].a")]
#[case::mixed(vec![JsonKey::from("a"), JsonKey::from(2), JsonKey::from("b")], "a[2].b")]
#[case::empty(Vec::new(), "")]
fn format_path_cases(#[case] keys: Vec<JsonKey>, #[case] expected: &str) {
    assert_eq!(format_path(&keys), expected);
}

// ---------------------------------------------------------------------------
// descend — presence
// ---------------------------------------------------------------------------

#[test]
fn empty_path_resolves_to_root() {
    let data = json!({"a": 1});
    let resolved = descend(&data, &[]).expect("descend");
    assert_eq!(resolved, Some(&data));
}

#[test]
fn resolves_nested_value() {
    let data = json!({"a": {"b": [10, 20]}});
    let keys = path(&[JsonKey::from("a"), JsonKey::from("b"), JsonKey::from(1)]);
    let resolved = descend(&data, &keys).expect("descend");
    assert_eq!(resolved, Some(&json!(20)));
}

#[test]
fn null_value_is_present() {
    let data = json!({"a": null});
    let resolved = descend(&data, &[JsonKey::from("a")]).expect("descend");
    assert_eq!(resolved, Some(&Value::Null));
}

#[test]
fn missing_final_field_is_absent_not_error() {
    let data = json!({"a": 1});
    let resolved = descend(&data, &[JsonKey::from("b")]).expect("descend");
    assert_eq!(resolved, None);
}

#[test]
fn out_of_bounds_final_index_is_absent_not_error() {
    let data = json!([1, 2]);
    let resolved = descend(&data, &[JsonKey::from(5)]).expect("descend");
    assert_eq!(resolved, None);
}

// ---------------------------------------------------------------------------
// descend — structural errors
// ---------------------------------------------------------------------------

#[test]
fn missing_inner_field_is_an_error() {
    let data = json!({"a": 1});
    let keys = path(&[JsonKey::from("b"), JsonKey::from("c")]);
    let err = descend(&data, &keys).expect_err("inner key missing");
    assert_eq!(err, DescentError::MissingKey { path: "b".into() });
}

#[test]
fn out_of_bounds_inner_index_is_an_error() {
    let data = json!([[1]]);
    let keys = path(&[JsonKey::from(3), JsonKey::from(0)]);
    let err = descend(&data, &keys).expect_err("inner index out of bounds");
    assert_eq!(err, DescentError::IndexOutOfBounds { path: "[3]".into() });
}

#[rstest]
#[case::field_into_array(json!([1]), path(&[JsonKey::from("a")]))]
#[case::field_into_scalar(json!({"a": 1}), path(&[JsonKey::from("a"), JsonKey::from("b")]))]
fn field_step_requires_object(#[case] data: Value, #[case] keys: Vec<JsonKey>) {
    let err = descend(&data, &keys).expect_err("should fail");
    assert!(matches!(err, DescentError::NotAnObject { .. }));
}

#[test]
fn index_step_requires_array() {
    let data = json!({"a": {"b": 1}});
    let keys = path(&[JsonKey::from("a"), JsonKey::from(0)]);
    let err = descend(&data, &keys).expect_err("should fail");
    assert_eq!(err, DescentError::NotAnArray { path: "a[0]".into() });
}
