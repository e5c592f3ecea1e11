//! Fluent description of one expected client call.
//!
//! An [`ExpectedCall`] bundles what the mocked client should hand back
//! (status, body or error, response headers) with how to validate the
//! request the code under test actually made (method, reduced URL, query
//! parameters, headers, raw content, form fields or JSON paths). Instances
//! are ephemeral; they live for a single test run inside a
//! [`MockClient`](crate::MockClient) queue.
//!
//! Builder misuse — a lower-case method, mixing form and JSON expectations,
//! giving both a result body and an error body — is a bug in the test
//! itself and panics immediately.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::client::Headers;
use crate::json::JsonPath;

/// Predicate applied to the raw request body.
pub type ContentPredicate = Box<dyn Fn(&[u8]) -> bool>;

/// Canned error data returned instead of a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ErrorData {
    pub(crate) msg: String,
    pub(crate) body: Option<Vec<u8>>,
}

/// Expectations on an urlencoded form body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FormExpectations {
    pub(crate) present: BTreeSet<String>,
    /// Expected values per key; an empty list means the key must be absent.
    pub(crate) values: BTreeMap<String, Vec<String>>,
}

/// Expectations on a JSON body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct JsonExpectations {
    pub(crate) present: BTreeSet<JsonPath>,
    pub(crate) absent: BTreeSet<JsonPath>,
    pub(crate) values: BTreeMap<JsonPath, Value>,
}

/// Structured body expectations; form and JSON are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BodyExpectations {
    Form(FormExpectations),
    Json(JsonExpectations),
}

/// Describes one call to the mocked client.
///
/// # Example
///
/// ```
/// use stagehand_mock::ExpectedCall;
///
/// let call = ExpectedCall::new("GET", 200)
///     .result_str("hello")
///     .expect_url("https://example.com/api")
///     .without_query()
///     .expect_query_values("page", &["2"]);
/// ```
pub struct ExpectedCall {
    pub(crate) method: String,
    pub(crate) status: u16,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) headers: Headers,
    pub(crate) error: Option<ErrorData>,
    pub(crate) transport_error: Option<String>,
    pub(crate) expected_url: Option<String>,
    pub(crate) url_without_query: bool,
    pub(crate) url_without_fragment: bool,
    /// Expected request headers; `None` means the header must be unset.
    pub(crate) expected_headers: BTreeMap<String, Option<String>>,
    pub(crate) expected_query: BTreeMap<String, Vec<String>>,
    pub(crate) expected_content: Option<Vec<u8>>,
    pub(crate) content_predicate: Option<ContentPredicate>,
    pub(crate) body_expectations: Option<BodyExpectations>,
}

impl ExpectedCall {
    /// Creates an expected call returning the given HTTP status.
    ///
    /// # Panics
    ///
    /// Panics when `method` is not upper-case; HTTP method names are
    /// case-sensitive (RFCs 7230 and 7231).
    #[must_use]
    pub fn new(method: impl Into<String>, status: u16) -> Self {
        let method = method.into();
        assert!(
            method.chars().all(|c| !c.is_ascii_lowercase()),
            "HTTP method names are case-sensitive and should be upper-case (RFCs 7230 and 7231)"
        );
        Self {
            method,
            status,
            body: None,
            headers: Headers::new(),
            error: None,
            transport_error: None,
            expected_url: None,
            url_without_query: false,
            url_without_fragment: false,
            expected_headers: BTreeMap::new(),
            expected_query: BTreeMap::new(),
            expected_content: None,
            content_predicate: None,
            body_expectations: None,
        }
    }

    /// Sets the body the call returns.
    ///
    /// # Panics
    ///
    /// Panics when an error body was already configured.
    #[must_use]
    pub fn result(mut self, body: impl Into<Vec<u8>>) -> Self {
        assert!(
            self.error.as_ref().is_none_or(|e| e.body.is_none()),
            "result must not be given if an error body is provided"
        );
        assert!(
            self.transport_error.is_none(),
            "result must not be given if a transport error is provided"
        );
        self.body = Some(body.into());
        self
    }

    /// Sets the body the call returns from a text string.
    ///
    /// # Panics
    ///
    /// Panics when an error body was already configured.
    #[must_use]
    pub fn result_str(self, body: &str) -> Self {
        self.result(body.as_bytes().to_vec())
    }

    /// Sets the body the call returns from a JSON value.
    ///
    /// # Panics
    ///
    /// Panics when an error body was already configured.
    #[must_use]
    pub fn result_json(self, body: &Value) -> Self {
        self.result(body.to_string().into_bytes())
    }

    /// Makes the call fail with an HTTP-level error and no readable body.
    ///
    /// # Panics
    ///
    /// Panics when a result body was already configured.
    #[must_use]
    pub fn error(self, msg: impl Into<String>) -> Self {
        self.set_error(msg.into(), None)
    }

    /// Makes the call fail with an HTTP-level error carrying a body.
    ///
    /// # Panics
    ///
    /// Panics when a result body was already configured.
    #[must_use]
    pub fn error_with_body(self, msg: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.set_error(msg.into(), Some(body.into()))
    }

    fn set_error(mut self, msg: String, body: Option<Vec<u8>>) -> Self {
        assert!(
            body.is_none() || self.body.is_none(),
            "error body must not be given if a result is provided"
        );
        self.error = Some(ErrorData { msg, body });
        self
    }

    /// Makes the call fail before any HTTP response is produced.
    ///
    /// # Panics
    ///
    /// Panics when a result body was already configured.
    #[must_use]
    pub fn transport_error(mut self, msg: impl Into<String>) -> Self {
        assert!(
            self.body.is_none(),
            "result must not be given if a transport error is provided"
        );
        self.transport_error = Some(msg.into());
        self
    }

    /// Adds a header to the returned response.
    #[must_use]
    pub fn return_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the expected URL for the call.
    #[must_use]
    pub fn expect_url(mut self, url: impl Into<String>) -> Self {
        self.expected_url = Some(url.into());
        self
    }

    /// Compares the URL with its query string stripped.
    #[must_use]
    pub const fn without_query(mut self) -> Self {
        self.url_without_query = true;
        self
    }

    /// Compares the URL with its fragment stripped.
    #[must_use]
    pub const fn without_fragment(mut self) -> Self {
        self.url_without_fragment = true;
        self
    }

    /// Expects a query parameter with exactly the given values.
    #[must_use]
    pub fn expect_query_values(mut self, parameter: impl Into<String>, values: &[&str]) -> Self {
        self.expected_query
            .insert(parameter.into(), values.iter().map(|v| (*v).into()).collect());
        self
    }

    /// Expects a request header with the given value (name compared
    /// case-insensitively).
    #[must_use]
    pub fn expect_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.expected_headers.insert(name.into(), Some(value.into()));
        self
    }

    /// Expects a request header to be unset.
    #[must_use]
    pub fn expect_header_unset(mut self, name: impl Into<String>) -> Self {
        self.expected_headers.insert(name.into(), None);
        self
    }

    /// Expects the raw request body to match exactly.
    #[must_use]
    pub fn expect_content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.expected_content = Some(content.into());
        self
    }

    /// Expects the raw request body to satisfy a predicate.
    #[must_use]
    pub fn expect_content_predicate(
        mut self,
        predicate: impl Fn(&[u8]) -> bool + 'static,
    ) -> Self {
        self.content_predicate = Some(Box::new(predicate));
        self
    }

    /// Expects a form field to be present in the request body.
    ///
    /// # Panics
    ///
    /// Panics when JSON expectations were already configured.
    #[must_use]
    pub fn expect_form_present(mut self, key: impl Into<String>) -> Self {
        self.form_mut().present.insert(key.into());
        self
    }

    /// Expects a form field with exactly the given value.
    ///
    /// # Panics
    ///
    /// Panics when JSON expectations were already configured.
    #[must_use]
    pub fn expect_form_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_mut().values.insert(key.into(), vec![value.into()]);
        self
    }

    /// Expects a form field to be absent from the request body.
    ///
    /// # Panics
    ///
    /// Panics when JSON expectations were already configured.
    #[must_use]
    pub fn expect_form_value_absent(mut self, key: impl Into<String>) -> Self {
        self.form_mut().values.insert(key.into(), Vec::new());
        self
    }

    /// Expects a JSON path to be present in the request body.
    ///
    /// # Panics
    ///
    /// Panics when form expectations were already configured.
    #[must_use]
    pub fn expect_json_present(mut self, path: JsonPath) -> Self {
        self.json_mut().present.insert(path);
        self
    }

    /// Expects a JSON path to resolve to exactly the given value.
    ///
    /// # Panics
    ///
    /// Panics when form expectations were already configured.
    #[must_use]
    pub fn expect_json_value(mut self, path: JsonPath, value: Value) -> Self {
        self.json_mut().values.insert(path, value);
        self
    }

    /// Expects a JSON path to be absent from the request body.
    ///
    /// # Panics
    ///
    /// Panics when form expectations were already configured.
    #[must_use]
    pub fn expect_json_value_absent(mut self, path: JsonPath) -> Self {
        self.json_mut().absent.insert(path);
        self
    }

    fn form_mut(&mut self) -> &mut FormExpectations {
        let expectations = self
            .body_expectations
            .get_or_insert_with(|| BodyExpectations::Form(FormExpectations::default()));
        match expectations {
            BodyExpectations::Form(form) => form,
            BodyExpectations::Json(_) => {
                panic!("form expectations must not be mixed with JSON expectations")
            }
        }
    }

    fn json_mut(&mut self) -> &mut JsonExpectations {
        let expectations = self
            .body_expectations
            .get_or_insert_with(|| BodyExpectations::Json(JsonExpectations::default()));
        match expectations {
            BodyExpectations::Json(json) => json,
            BodyExpectations::Form(_) => {
                panic!("JSON expectations must not be mixed with form expectations")
            }
        }
    }

    /// Returns the HTTP method this call expects.
    #[must_use]
    pub fn method(&self) -> &str {
        self.method.as_str()
    }

    /// Returns the HTTP status this call returns.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }
}

impl std::fmt::Debug for ExpectedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpectedCall")
            .field("method", &self.method)
            .field("status", &self.status)
            .field("expected_url", &self.expected_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
