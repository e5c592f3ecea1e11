//! Fixture runners that replay scripted HTTP call sequences.
//!
//! These exist to exercise the mock client from the consumer side: a test
//! describes a sequence of calls as data, the runner performs them through
//! an [`HttpClient`], and every outcome is reported back as a
//! [`CallReport`] with base64-encoded content.
//!
//! The two runners differ in error policy. [`run_fetch_sequence`] folds
//! HTTP error statuses into their report and only fails on transport
//! errors. [`run_lookup_sequence`] does the same for HTTP errors but
//! reports transport failures as a lookup error naming method and URL.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use stagehand_mock::{Headers, HttpClient, HttpError, HttpRequest};
use tracing::debug;

use crate::error::FixtureError;

fn method_default() -> String {
    "GET".to_owned()
}

/// One scripted HTTP call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSpec {
    /// URL to call.
    pub url: String,
    /// HTTP method, `GET` when omitted.
    #[serde(default = "method_default")]
    pub method: String,
    /// Request headers.
    #[serde(default)]
    pub headers: Headers,
    /// Base64-encoded request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl CallSpec {
    /// Creates a `GET` spec without headers or body.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method_default(),
            headers: Headers::new(),
            data: None,
        }
    }
}

/// Outcome of one scripted call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallReport {
    /// HTTP status of the response.
    pub status: u16,
    /// Base64-encoded response content; empty when there was none.
    pub content: String,
    /// Response headers.
    pub headers: Headers,
}

fn encode_content(body: &[u8]) -> String {
    if body.is_empty() {
        String::new()
    } else {
        BASE64.encode(body)
    }
}

fn build_request(spec: &CallSpec) -> Result<HttpRequest, FixtureError> {
    let mut request =
        HttpRequest::new(spec.method.clone(), spec.url.clone()).with_headers(spec.headers.clone());
    if let Some(data) = &spec.data {
        request = request.with_body(BASE64.decode(data)?);
    }
    Ok(request)
}

/// Performs every call in the sequence, reporting HTTP errors as results.
///
/// # Errors
///
/// Returns [`FixtureError::Data`] for invalid base64 request data and
/// [`FixtureError::Transport`] when a call produced no HTTP response.
pub fn run_fetch_sequence(
    client: &mut dyn HttpClient,
    sequence: &[CallSpec],
) -> Result<Vec<CallReport>, FixtureError> {
    let mut reports = Vec::with_capacity(sequence.len());
    for spec in sequence {
        let request = build_request(spec)?;
        debug!(method = %spec.method, url = %spec.url, "performing scripted call");
        let report = match client.call(request) {
            Ok(response) => CallReport {
                status: response.status,
                content: encode_content(&response.body),
                headers: response.headers,
            },
            Err(HttpError::Status {
                status,
                headers,
                body,
                ..
            }) => CallReport {
                status,
                content: encode_content(&body),
                headers,
            },
            Err(HttpError::Transport { msg }) => {
                return Err(FixtureError::Transport {
                    url: spec.url.clone(),
                    msg,
                });
            }
        };
        reports.push(report);
    }
    Ok(reports)
}

/// Calls every URL with shared options, reporting HTTP errors as results.
///
/// # Errors
///
/// Returns [`FixtureError::Data`] for invalid base64 request data and
/// [`FixtureError::Lookup`] when a call produced no HTTP response.
pub fn run_lookup_sequence(
    client: &mut dyn HttpClient,
    urls: &[String],
    options: &LookupOptions,
) -> Result<Vec<CallReport>, FixtureError> {
    let body = options
        .data
        .as_ref()
        .map(|data| BASE64.decode(data))
        .transpose()?;

    let mut reports = Vec::with_capacity(urls.len());
    for url in urls {
        let mut request =
            HttpRequest::new(options.method.clone(), url.clone()).with_headers(options.headers.clone());
        if let Some(bytes) = &body {
            request = request.with_body(bytes.clone());
        }
        debug!(method = %options.method, url = %url, "performing lookup call");
        let report = match client.call(request) {
            Ok(response) => CallReport {
                status: response.status,
                content: encode_content(&response.body),
                headers: response.headers,
            },
            Err(HttpError::Status {
                status,
                headers,
                body: error_body,
                ..
            }) => CallReport {
                status,
                content: encode_content(&error_body),
                headers,
            },
            Err(HttpError::Transport { msg }) => {
                return Err(FixtureError::Lookup {
                    method: options.method.clone(),
                    url: url.clone(),
                    msg,
                });
            }
        };
        reports.push(report);
    }
    Ok(reports)
}

/// Options shared by every call of a lookup sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupOptions {
    /// HTTP method, `GET` when omitted.
    #[serde(default = "method_default")]
    pub method: String,
    /// Request headers.
    #[serde(default)]
    pub headers: Headers,
    /// Base64-encoded request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            method: method_default(),
            headers: Headers::new(),
            data: None,
        }
    }
}
