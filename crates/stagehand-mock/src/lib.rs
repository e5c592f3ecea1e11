//! Request-matching mock framework for HTTP client calls.
//!
//! Host-framework plugins talk to HTTP services through a single
//! client-call-shaped seam. This crate provides the test double for that
//! seam: tests queue up [`ExpectedCall`]s describing both the validation to
//! apply to each outgoing request (method, reduced URL, query parameters,
//! headers, form fields or JSON paths) and the canned response or error to
//! hand back, then substitute a [`MockClient`] for the real client.
//!
//! Matching is strictly sequential and single-threaded: the Nth call made
//! by the code under test must match the Nth queued expectation. Any
//! mismatch panics with an expected-versus-actual description; so does a
//! call beyond the end of the queue, and [`MockClient::verify`] (or
//! dropping the mock) catches expectations that were never consumed.
//!
//! # Example
//!
//! ```
//! use stagehand_mock::{ExpectedCall, HttpClient, HttpRequest, MockClient};
//!
//! let mut client = MockClient::new(vec![
//!     ExpectedCall::new("GET", 200)
//!         .result_str("{\"status\": \"disabled\"}")
//!         .expect_url("https://api.example.com/firewall/1.2.3.4"),
//! ]);
//!
//! // code under test
//! let response = client
//!     .call(HttpRequest::new("GET", "https://api.example.com/firewall/1.2.3.4"))
//!     .expect("canned response");
//! assert_eq!(response.status, 200);
//!
//! client.verify();
//! ```

mod call;
mod client;
mod json;
mod matcher;
mod mock;
mod urls;

pub use call::{ContentPredicate, ExpectedCall};
pub use client::{Headers, HttpClient, HttpError, HttpRequest, HttpResponse};
pub use json::{DescentError, JsonKey, JsonPath, descend, format_path};
pub use matcher::{CallMismatch, validate_call};
pub use mock::MockClient;
pub use urls::{ParamMap, extract_query, parse_form, reduce_url};
