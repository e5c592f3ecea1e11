//! Errors raised by the redirect bookkeeping operations.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::plugins::PluginType;

/// Failure modes of manifest and plugin-tree operations.
#[derive(Debug, Error)]
pub enum MetaError {
    /// One redirect source was given two different destinations.
    #[error(
        "{plugin_type} {redirect_source} maps to both {first} and {second}"
    )]
    RedirectConflict {
        /// Plugin category the conflict occurred in.
        plugin_type: PluginType,
        /// Redirect source name.
        redirect_source: String,
        /// Destination recorded first.
        first: String,
        /// Conflicting destination recorded later.
        second: String,
    },

    /// The collection root does not contain a `galaxy.yml`.
    #[error("'{path}' does not exist; run from a collection root containing galaxy.yml")]
    NotACollection {
        /// Path that was checked.
        path: PathBuf,
    },

    /// A YAML document could not be read or written.
    #[error("failed to process YAML file '{path}': {source}")]
    Yaml {
        /// File being processed.
        path: PathBuf,
        /// Underlying YAML error.
        #[source]
        source: serde_yaml::Error,
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
}

impl MetaError {
    /// Wraps an I/O error with the path it occurred on.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Wraps a YAML error with the file it occurred on.
    pub(crate) fn yaml(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        Self::Yaml {
            path: path.into(),
            source,
        }
    }
}
