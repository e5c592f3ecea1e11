//! Domain errors raised by snapshot and diff operations.
//!
//! All errors use `thiserror`-derived enums with structured context. I/O
//! errors are wrapped in `Arc` so error values stay cheap to clone.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors arising from snapshot collection and diffing.
#[derive(Debug, Clone, Error)]
pub enum StateError {
    /// A required file does not exist.
    #[error("the file '{path}' does not exist")]
    Missing {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// A path is neither a regular file nor a symlink.
    #[error("the path '{path}' is not a file or symlink - this is not supported")]
    Unsupported {
        /// Offending path.
        path: PathBuf,
    },

    /// An underlying filesystem operation failed.
    #[error("failed to access '{path}': {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The value handed to the diff is not the result of a collect run.
    #[error("the state must be the result of a collect operation")]
    NotASnapshot,

    /// The snapshot was written by an incompatible format version.
    #[error("unsupported snapshot version {actual} (expected {expected})")]
    Version {
        /// Version this crate understands.
        expected: u32,
        /// Version found in the snapshot.
        actual: u32,
    },
}

impl StateError {
    /// Wraps an I/O error with the path it occurred on.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}
