//! Snapshot collection: record the state of files and directories on disk.
//!
//! A [`Snapshot`] is created once by [`collect`] and consumed later by
//! [`diff`](crate::diff). It is immutable after creation and carries a
//! format version so that mismatched snapshots are rejected instead of
//! silently producing nonsense diffs.
//!
//! Policy decisions baked into collection: symlinks are recorded as their
//! target and never followed; a path that is neither a regular file nor a
//! symlink fails the operation; directory walks record entries in
//! directory order.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::StateError;
use crate::stat::StatRecord;

/// Version tag of the snapshot format.
pub const STATE_VERSION: u32 = 1;

const fn exists_default() -> bool {
    true
}

/// Recorded state of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileState {
    /// Whether the file existed at collection time.
    #[serde(default = "exists_default")]
    pub exists: bool,
    /// Metadata record; absent for files recorded as non-existing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat: Option<StatRecord>,
    /// Symlink target when the entry is a symlink.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symlink: Option<PathBuf>,
    /// Base64-encoded content when collected with `check_content`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// SHA-256 hex digest when collected without `check_content`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl FileState {
    const fn missing() -> Self {
        Self {
            exists: false,
            stat: None,
            symlink: None,
            content: None,
            sha256: None,
        }
    }
}

/// Recorded listing of one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryState {
    /// Names of the files directly inside the directory.
    pub files: Vec<String>,
    /// Names of the subdirectories; only recorded by recursive walks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directories: Option<Vec<String>>,
    /// Metadata record, when one was taken for the directory itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat: Option<StatRecord>,
}

/// The recorded state of a set of files and directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot format version; see [`STATE_VERSION`].
    pub version: u32,
    /// Per-file records keyed by path.
    pub files: BTreeMap<PathBuf, FileState>,
    /// Per-directory records keyed by path.
    pub directories: BTreeMap<PathBuf, DirectoryState>,
}

impl Snapshot {
    /// Checks that the snapshot carries the supported format version.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Version`] on a version mismatch.
    pub const fn validate(&self) -> Result<(), StateError> {
        if self.version != STATE_VERSION {
            return Err(StateError::Version {
                expected: STATE_VERSION,
                actual: self.version,
            });
        }
        Ok(())
    }

    /// Deserializes a snapshot from a JSON value.
    ///
    /// Accepts either the snapshot itself or a wrapper that nests it under a
    /// `state` key — callers routinely hand over the whole recorded result
    /// of the collect step.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NotASnapshot`] when neither shape matches and
    /// [`StateError::Version`] on a version mismatch.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, StateError> {
        if let Ok(snapshot) = serde_json::from_value::<Self>(value.clone()) {
            snapshot.validate()?;
            return Ok(snapshot);
        }
        if let Some(inner) = value.get("state") {
            if let Ok(snapshot) = serde_json::from_value::<Self>(inner.clone()) {
                snapshot.validate()?;
                return Ok(snapshot);
            }
        }
        Err(StateError::NotASnapshot)
    }
}

/// What to record for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    /// Path of the file.
    pub path: PathBuf,
    /// Store the full content instead of only a checksum.
    #[serde(default)]
    pub check_content: bool,
    /// Record a non-existing file instead of failing.
    #[serde(default)]
    pub allow_not_existing: bool,
}

impl FileSpec {
    /// Creates a spec with both options off.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            check_content: false,
            allow_not_existing: false,
        }
    }
}

const fn recursive_default() -> bool {
    true
}

/// What to record for one directory tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirSpec {
    /// Path of the directory.
    pub path: PathBuf,
    /// Store full file contents instead of only checksums.
    #[serde(default)]
    pub check_content: bool,
    /// Walk subdirectories as well.
    #[serde(default = "recursive_default")]
    pub recursive: bool,
}

impl DirSpec {
    /// Creates a recursive spec without content storage.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            check_content: false,
            recursive: true,
        }
    }
}

/// The set of paths a collect run should record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectRequest {
    /// Individual files to record.
    #[serde(default)]
    pub files: Vec<FileSpec>,
    /// Directory trees to record.
    #[serde(default)]
    pub directories: Vec<DirSpec>,
}

/// Records the state of all requested files and directories.
///
/// # Errors
///
/// Fails when a file is missing (unless marked `allow_not_existing`), when
/// a path is neither a regular file nor a symlink, or on I/O errors.
pub fn collect(request: &CollectRequest) -> Result<Snapshot, StateError> {
    let mut files = BTreeMap::new();
    let mut directories = BTreeMap::new();

    for spec in &request.files {
        let state = record_file(&spec.path, spec.check_content, spec.allow_not_existing)?;
        files.insert(spec.path.clone(), state);
    }

    for spec in &request.directories {
        walk_directory(&spec.path, spec, &mut files, &mut directories)?;
    }

    debug!(
        files = files.len(),
        directories = directories.len(),
        "collected snapshot"
    );
    Ok(Snapshot {
        version: STATE_VERSION,
        files,
        directories,
    })
}

/// Records one file, following the symlink/content policy.
fn record_file(
    path: &Path,
    check_content: bool,
    allow_not_existing: bool,
) -> Result<FileState, StateError> {
    // follows symlinks: a dangling link counts as not existing
    if fs::metadata(path).is_err() {
        if !allow_not_existing {
            return Err(StateError::Missing { path: path.into() });
        }
        return Ok(FileState::missing());
    }

    let metadata = fs::symlink_metadata(path).map_err(|e| StateError::io(path, e))?;
    let mut state = FileState {
        exists: true,
        stat: Some(StatRecord::from_metadata(&metadata)),
        symlink: None,
        content: None,
        sha256: None,
    };

    if metadata.file_type().is_symlink() {
        state.symlink = Some(fs::read_link(path).map_err(|e| StateError::io(path, e))?);
    } else if metadata.is_file() {
        let content = fs::read(path).map_err(|e| StateError::io(path, e))?;
        if check_content {
            state.content = Some(BASE64.encode(&content));
        } else {
            state.sha256 = Some(sha256_hex(&content));
        }
    } else {
        return Err(StateError::Unsupported { path: path.into() });
    }

    Ok(state)
}

/// Walks a directory in directory order, recording files and listings.
fn walk_directory(
    dir: &Path,
    spec: &DirSpec,
    files: &mut BTreeMap<PathBuf, FileState>,
    directories: &mut BTreeMap<PathBuf, DirectoryState>,
) -> Result<(), StateError> {
    let (file_names, dir_names) = list_directory(dir)?;

    for name in &file_names {
        let path = dir.join(name);
        let state = record_file(&path, spec.check_content, false)?;
        files.insert(path, state);
    }

    let listing = DirectoryState {
        files: file_names,
        directories: spec.recursive.then(|| dir_names.clone()),
        stat: None,
    };
    directories.insert(dir.into(), listing);

    if spec.recursive {
        for name in &dir_names {
            let path = dir.join(name);
            // symlinked directories are listed but never followed
            if !fs::symlink_metadata(&path)
                .map_err(|e| StateError::io(&path, e))?
                .file_type()
                .is_symlink()
            {
                walk_directory(&path, spec, files, directories)?;
            }
        }
    }
    Ok(())
}

/// Splits a directory's entries into file names and directory names.
///
/// Symlinks pointing at directories are listed as directories (matching
/// classic directory-walk semantics) but callers never descend into them.
pub(crate) fn list_directory(dir: &Path) -> Result<(Vec<String>, Vec<String>), StateError> {
    let mut file_names = Vec::new();
    let mut dir_names = Vec::new();
    for item in fs::read_dir(dir).map_err(|e| StateError::io(dir, e))? {
        let entry = item.map_err(|e| StateError::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let file_type = entry.file_type().map_err(|e| StateError::io(dir, e))?;
        let is_dir = if file_type.is_symlink() {
            fs::metadata(entry.path()).is_ok_and(|m| m.is_dir())
        } else {
            file_type.is_dir()
        };
        if is_dir {
            dir_names.push(name);
        } else {
            file_names.push(name);
        }
    }
    Ok((file_names, dir_names))
}

/// Hex-encoded SHA-256 digest.
pub(crate) fn sha256_hex(content: &[u8]) -> String {
    use std::fmt::Write as _;
    let digest = Sha256::digest(content);
    digest.iter().fold(String::new(), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}
