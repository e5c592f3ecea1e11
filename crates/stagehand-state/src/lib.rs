//! Filesystem snapshot and comparison toolkit.
//!
//! `stagehand-state` records the state of files and directory trees and
//! later checks whether anything changed. The primary use case is
//! idempotence validation: record a snapshot, run an operation that is
//! supposed to change nothing, then diff against the live filesystem.
//!
//! The workflow has two halves:
//!
//! 1. [`collect`] walks the requested files and directories and produces a
//!    serialisable [`Snapshot`]. File metadata is taken with `lstat`
//!    semantics, symlinks are recorded as their target, and file content is
//!    captured either as a SHA-256 digest or in full.
//! 2. [`diff`] re-examines every recorded path and produces a
//!    [`DiffReport`] listing added, removed and changed entries, plus a
//!    prepared textual diff.
//!
//! # Example
//!
//! ```rust,no_run
//! use stagehand_state::{CollectRequest, DiffOptions, DirSpec, collect, diff};
//!
//! # fn main() -> Result<(), stagehand_state::StateError> {
//! let request = CollectRequest {
//!     files: Vec::new(),
//!     directories: vec![DirSpec::new("/etc/myapp")],
//! };
//! let snapshot = collect(&request)?;
//! // ... run the operation under test ...
//! let report = diff(&snapshot, &DiffOptions::default())?;
//! assert!(!report.changed, "operation was not idempotent:\n{}", report.prepared);
//! # Ok(())
//! # }
//! ```

mod diff;
mod error;
mod snapshot;
mod stat;

pub use diff::{DiffOptions, DiffReport, diff};
pub use error::StateError;
pub use snapshot::{
    CollectRequest, DirSpec, DirectoryState, FileSpec, FileState, STATE_VERSION, Snapshot, collect,
};
pub use stat::StatRecord;
