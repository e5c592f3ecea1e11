//! The client-call seam intercepted by the mock.
//!
//! Code under test talks to its HTTP service through the [`HttpClient`]
//! trait: one request in, one response (or error) out. The host framework
//! supplies the real implementation; tests substitute a
//! [`MockClient`](crate::MockClient). Implementing the actual wire protocol
//! is explicitly out of scope for this crate.

use std::collections::BTreeMap;

use thiserror::Error;

/// Header map used on both sides of the seam.
///
/// Keys are compared case-insensitively during validation; response headers
/// returned by the mock are lowercased.
pub type Headers = BTreeMap<String, String>;

/// One outgoing client call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Upper-case HTTP method.
    pub method: String,
    /// Full request URL, including query and fragment.
    pub url: String,
    /// Request headers.
    pub headers: Headers,
    /// Request body, when one is sent.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a request with no headers and no body.
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Headers::new(),
            body: None,
        }
    }

    /// Sets the request headers.
    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// What the client returned for a successful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// The URL the response was served from.
    pub url: String,
    /// Response headers with lowercased names.
    pub headers: Headers,
    /// Response body.
    pub body: Vec<u8>,
}

/// Failure modes of a client call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpError {
    /// The server answered with an error status; the body is still readable.
    #[error("HTTP error {status}: {msg}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Human-readable failure description.
        msg: String,
        /// Response headers with lowercased names.
        headers: Headers,
        /// Error response body.
        body: Vec<u8>,
    },
    /// The call never produced an HTTP response.
    #[error("connection error: {msg}")]
    Transport {
        /// Human-readable failure description.
        msg: String,
    },
}

/// A client-call-shaped function.
pub trait HttpClient {
    /// Performs one HTTP call.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Status`] for HTTP-level failures and
    /// [`HttpError::Transport`] when no response was received at all.
    fn call(&mut self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}
