//! Validation of a recorded request against an expectation.
//!
//! [`validate_call`] runs every check an [`ExpectedCall`] carries and stops
//! at the first mismatch. Mismatches are materialised as [`CallMismatch`]
//! values carrying expected and actual data, so the comparison logic is
//! testable on its own; the [`MockClient`](crate::MockClient) turns them
//! into panics.

use serde_json::Value;
use thiserror::Error;

use crate::call::{BodyExpectations, ExpectedCall, FormExpectations, JsonExpectations};
use crate::client::HttpRequest;
use crate::json::{DescentError, descend, format_path};
use crate::urls::{extract_query, parse_form, reduce_url};

/// A request did not match its expectation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallMismatch {
    /// The HTTP method differs.
    #[error("expected method does not match for call: '{actual}' instead of '{expected}'")]
    Method {
        /// Method the expectation requires.
        expected: String,
        /// Method the request used.
        actual: String,
    },
    /// The (reduced) URL differs.
    #[error("expected URL does not match for call: '{actual}' instead of '{expected}'")]
    Url {
        /// URL the expectation requires.
        expected: String,
        /// Reduced URL the request used.
        actual: String,
    },
    /// A query parameter is missing or has the wrong values.
    #[error("query parameter '{name}': expected {expected:?}, got {actual:?}")]
    QueryParameter {
        /// Parameter name.
        name: String,
        /// Values the expectation requires.
        expected: Vec<String>,
        /// Values the request supplied, if any.
        actual: Option<Vec<String>>,
    },
    /// A header is missing, unexpectedly present, or has the wrong value.
    #[error("header '{name}': expected {expected:?}, got {actual:?}")]
    Header {
        /// Header name as given in the expectation.
        name: String,
        /// Expected value; `None` means the header must be unset.
        expected: Option<String>,
        /// Value the request supplied, if any.
        actual: Option<String>,
    },
    /// The raw request body differs.
    #[error("expected content does not match for call: {actual:?} instead of {expected:?}")]
    Content {
        /// Body the expectation requires.
        expected: Vec<u8>,
        /// Body the request supplied, if any.
        actual: Option<Vec<u8>>,
    },
    /// The content predicate returned false.
    #[error("content does not match predicate for call")]
    Predicate,
    /// A required form key is missing.
    #[error("form key '{key}' not present")]
    FormKeyMissing {
        /// Key name.
        key: String,
    },
    /// A forbidden form key is present.
    #[error("form key '{key}' not absent")]
    FormKeyPresent {
        /// Key name.
        key: String,
    },
    /// A form key has the wrong values.
    #[error("form key '{key}' does not have values {expected:?}, but {actual:?}")]
    FormValue {
        /// Key name.
        key: String,
        /// Values the expectation requires.
        expected: Vec<String>,
        /// Values the request supplied.
        actual: Vec<String>,
    },
    /// The body is not valid JSON although JSON expectations were given.
    #[error("request body is not valid JSON: {msg}")]
    BodyNotJson {
        /// Parser failure description.
        msg: String,
    },
    /// A required JSON path is missing.
    #[error("JSON key {path} not present")]
    JsonKeyMissing {
        /// Rendered path.
        path: String,
    },
    /// A forbidden JSON path is present.
    #[error("JSON key {path} present")]
    JsonKeyPresent {
        /// Rendered path.
        path: String,
    },
    /// A JSON path resolves to the wrong value.
    #[error("JSON key {path} does not have value {expected}, but {actual}")]
    JsonValue {
        /// Rendered path.
        path: String,
        /// Value the expectation requires.
        expected: Value,
        /// Value the request supplied.
        actual: Value,
    },
    /// A JSON path addressed a structure the body does not have.
    #[error(transparent)]
    JsonDescent(#[from] DescentError),
}

/// Validates a request against an expectation.
///
/// # Errors
///
/// Returns the first [`CallMismatch`] encountered, in the order: method,
/// URL, query parameters, headers, raw content, content predicate, then
/// form or JSON body expectations.
pub fn validate_call(call: &ExpectedCall, request: &HttpRequest) -> Result<(), CallMismatch> {
    if request.method != call.method {
        return Err(CallMismatch::Method {
            expected: call.method.clone(),
            actual: request.method.clone(),
        });
    }

    if let Some(expected_url) = &call.expected_url {
        let reduced = reduce_url(&request.url, call.url_without_query, call.url_without_fragment);
        if &reduced != expected_url {
            return Err(CallMismatch::Url {
                expected: expected_url.clone(),
                actual: reduced,
            });
        }
    }

    validate_query(call, request)?;
    validate_headers(call, request)?;

    if let Some(expected_content) = &call.expected_content {
        if request.body.as_ref() != Some(expected_content) {
            return Err(CallMismatch::Content {
                expected: expected_content.clone(),
                actual: request.body.clone(),
            });
        }
    }

    if let Some(predicate) = &call.content_predicate {
        let body = request.body.as_deref().unwrap_or_default();
        if !predicate(body) {
            return Err(CallMismatch::Predicate);
        }
    }

    match &call.body_expectations {
        Some(BodyExpectations::Form(form)) => validate_form(form, request)?,
        Some(BodyExpectations::Json(json)) => validate_json(json, request)?,
        None => {}
    }

    Ok(())
}

fn validate_query(call: &ExpectedCall, request: &HttpRequest) -> Result<(), CallMismatch> {
    if call.expected_query.is_empty() {
        return Ok(());
    }
    let query = extract_query(&request.url);
    for (name, expected) in &call.expected_query {
        let actual = query.get(name);
        if actual != Some(expected) {
            return Err(CallMismatch::QueryParameter {
                name: name.clone(),
                expected: expected.clone(),
                actual: actual.cloned(),
            });
        }
    }
    Ok(())
}

fn validate_headers(call: &ExpectedCall, request: &HttpRequest) -> Result<(), CallMismatch> {
    if call.expected_headers.is_empty() {
        return Ok(());
    }
    let given: std::collections::BTreeMap<String, &str> = request
        .headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.as_str()))
        .collect();
    for (name, expected) in &call.expected_headers {
        let actual = given.get(&name.to_ascii_lowercase()).copied();
        if actual != expected.as_deref() {
            return Err(CallMismatch::Header {
                name: name.clone(),
                expected: expected.clone(),
                actual: actual.map(String::from),
            });
        }
    }
    Ok(())
}

fn validate_form(form: &FormExpectations, request: &HttpRequest) -> Result<(), CallMismatch> {
    let fields = request.body.as_deref().map(parse_form).unwrap_or_default();
    for key in &form.present {
        if !fields.contains_key(key) {
            return Err(CallMismatch::FormKeyMissing { key: key.clone() });
        }
    }
    for (key, expected) in &form.values {
        match fields.get(key) {
            None if expected.is_empty() => {}
            Some(_) if expected.is_empty() => {
                return Err(CallMismatch::FormKeyPresent { key: key.clone() });
            }
            Some(actual) if actual == expected => {}
            actual => {
                return Err(CallMismatch::FormValue {
                    key: key.clone(),
                    expected: expected.clone(),
                    actual: actual.cloned().unwrap_or_default(),
                });
            }
        }
    }
    Ok(())
}

fn validate_json(json: &JsonExpectations, request: &HttpRequest) -> Result<(), CallMismatch> {
    let body = request.body.as_deref().unwrap_or_default();
    let data: Value =
        serde_json::from_slice(body).map_err(|e| CallMismatch::BodyNotJson { msg: e.to_string() })?;
    for path in &json.present {
        if descend(&data, path)?.is_none() {
            return Err(CallMismatch::JsonKeyMissing {
                path: format_path(path),
            });
        }
    }
    for path in &json.absent {
        if descend(&data, path)?.is_some() {
            return Err(CallMismatch::JsonKeyPresent {
                path: format_path(path),
            });
        }
    }
    for (path, expected) in &json.values {
        let Some(actual) = descend(&data, path)? else {
            return Err(CallMismatch::JsonKeyMissing {
                path: format_path(path),
            });
        };
        if actual != expected {
            return Err(CallMismatch::JsonValue {
                path: format_path(path),
                expected: expected.clone(),
                actual: actual.clone(),
            });
        }
    }
    Ok(())
}
