//! Scripted HTTP call fixtures for exercising client test doubles.
//!
//! `stagehand-fixtures` provides deliberately thin runners that take a
//! description of HTTP calls as plain data, perform them through any
//! [`stagehand_mock::HttpClient`], and report every outcome with
//! base64-encoded content. They exist so integration tests can drive the
//! mock framework end to end without writing bespoke client code.
//!
//! # Example
//!
//! ```rust
//! use stagehand_fixtures::{CallSpec, run_fetch_sequence};
//! use stagehand_mock::{ExpectedCall, MockClient};
//!
//! let mut client = MockClient::new(vec![
//!     ExpectedCall::new("GET", 200)
//!         .expect_url("http://example.test/ping")
//!         .result_str("pong"),
//! ]);
//! let reports = run_fetch_sequence(&mut client, &[CallSpec::new("http://example.test/ping")])
//!     .unwrap();
//! client.verify();
//! assert_eq!(reports[0].status, 200);
//! ```

mod error;
mod sequence;

pub use error::FixtureError;
pub use sequence::{CallReport, CallSpec, LookupOptions, run_fetch_sequence, run_lookup_sequence};
