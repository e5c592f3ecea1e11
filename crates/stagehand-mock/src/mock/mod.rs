//! The sequential expectation queue.
//!
//! A [`MockClient`] is handed a list of [`ExpectedCall`]s and substituted
//! for the real client. Calls are validated strictly in order; the Nth call
//! must match the Nth expectation. Any mismatch, a call beyond the end of
//! the queue, and unconsumed expectations at the end of the test all fail
//! the test loudly.

use std::thread;

use crate::call::ExpectedCall;
use crate::client::{Headers, HttpClient, HttpError, HttpRequest, HttpResponse};
use crate::matcher::validate_call;

/// Mock implementation of [`HttpClient`] driven by an expectation queue.
///
/// # Example
///
/// ```
/// use stagehand_mock::{ExpectedCall, HttpClient, HttpRequest, MockClient};
///
/// let mut client = MockClient::new(vec![
///     ExpectedCall::new("GET", 200)
///         .result_str("hello")
///         .expect_url("https://example.com/api"),
/// ]);
///
/// let response = client
///     .call(HttpRequest::new("GET", "https://example.com/api"))
///     .expect("canned response");
/// assert_eq!(response.status, 200);
/// assert_eq!(response.body, b"hello");
///
/// client.verify();
/// ```
pub struct MockClient {
    calls: Vec<ExpectedCall>,
    index: usize,
    verified: bool,
}

impl MockClient {
    /// Creates a mock that expects exactly the given calls, in order.
    #[must_use]
    pub const fn new(calls: Vec<ExpectedCall>) -> Self {
        Self {
            calls,
            index: 0,
            verified: false,
        }
    }

    /// Asserts that every expected call has been made.
    ///
    /// # Panics
    ///
    /// Panics when expectations remain unconsumed.
    pub fn verify(mut self) {
        self.verified = true;
        assert!(
            self.index == self.calls.len(),
            "got fewer calls than expected ({} of {})",
            self.index,
            self.calls.len()
        );
    }

    /// Validates the request against the next queued expectation.
    ///
    /// # Panics
    ///
    /// Panics when the queue is exhausted or the request does not match.
    fn next_call(&mut self, request: &HttpRequest) -> &ExpectedCall {
        let position = self.index;
        assert!(
            position < self.calls.len(),
            "got more calls than expected ({} were queued); next was {} {}",
            self.calls.len(),
            request.method,
            request.url
        );
        self.index += 1;
        let call = match self.calls.get(position) {
            Some(call) => call,
            // guarded by the assertion above
            None => panic!("expectation queue exhausted"),
        };
        if let Err(mismatch) = validate_call(call, request) {
            panic!("call {} invalid: {mismatch}", position + 1);
        }
        call
    }

    fn lowercased_headers(call: &ExpectedCall) -> Headers {
        call.headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
            .collect()
    }
}

impl HttpClient for MockClient {
    fn call(&mut self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let call = self.next_call(&request);

        if let Some(msg) = &call.transport_error {
            return Err(HttpError::Transport { msg: msg.clone() });
        }
        if let Some(error) = &call.error {
            return Err(HttpError::Status {
                status: call.status,
                msg: error.msg.clone(),
                headers: Self::lowercased_headers(call),
                body: error.body.clone().unwrap_or_default(),
            });
        }
        Ok(HttpResponse {
            status: call.status,
            url: request.url,
            headers: Self::lowercased_headers(call),
            body: call.body.clone().unwrap_or_default(),
        })
    }
}

impl Drop for MockClient {
    fn drop(&mut self) {
        if self.verified || thread::panicking() {
            return;
        }
        assert!(
            self.index == self.calls.len(),
            "MockClient dropped with {} of {} expected calls unconsumed; call verify()",
            self.calls.len() - self.index,
            self.calls.len()
        );
    }
}

#[cfg(test)]
mod tests;
