//! Errors raised while driving a fixture call sequence.

use thiserror::Error;

/// Failure modes of the fixture runners.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FixtureError {
    /// A request body was not valid base64.
    #[error("invalid base64 request data: {0}")]
    Data(#[from] base64::DecodeError),

    /// A call failed before any HTTP response was received.
    #[error("connection error while calling '{url}': {msg}")]
    Transport {
        /// URL of the failed call.
        url: String,
        /// Failure description from the client.
        msg: String,
    },

    /// A lookup-style call failed for any reason other than an HTTP error
    /// status.
    #[error("Error while {method}ing {url}: {msg}")]
    Lookup {
        /// HTTP method of the failed call.
        method: String,
        /// URL of the failed call.
        url: String,
        /// Failure description from the client.
        msg: String,
    },
}
