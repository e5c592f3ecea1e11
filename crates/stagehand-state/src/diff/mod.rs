//! Compare a recorded [`Snapshot`] against the current filesystem.
//!
//! [`diff`] re-examines every path the snapshot recorded and reports what
//! changed since collection: added, removed and modified files and
//! directories, plus a prepared textual diff suitable for display.
//!
//! Directory comparisons are one level deep per recorded listing; recursive
//! collections already recorded every nested directory separately.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use similar::TextDiff;
use tracing::debug;

use crate::error::StateError;
use crate::snapshot::{DirectoryState, FileState, Snapshot, list_directory, sha256_hex};
use crate::stat::StatRecord;

/// Options controlling diff output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOptions {
    /// Include full unified content diffs instead of a `(...)` placeholder.
    pub content_diff: bool,
}

/// Result of comparing a snapshot against the current filesystem.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffReport {
    /// Whether anything changed at all.
    pub changed: bool,
    /// Whether any file content changed. Added or removed files and
    /// file/symlink conversions do not count.
    pub changed_content: bool,
    /// Files that appeared since collection.
    pub added_files: Vec<PathBuf>,
    /// Files that disappeared since collection.
    pub removed_files: Vec<PathBuf>,
    /// Files whose attributes, times or content changed.
    pub changed_files: Vec<PathBuf>,
    /// Files whose content changed; attribute-only changes do not count.
    pub changed_files_content: Vec<PathBuf>,
    /// Directories that appeared since collection.
    pub added_dirs: Vec<PathBuf>,
    /// Directories that disappeared since collection.
    pub removed_dirs: Vec<PathBuf>,
    /// Directories whose attributes or listings changed.
    pub changed_dirs: Vec<PathBuf>,
    /// Human-readable description of all differences.
    pub prepared: String,
}

#[derive(Default)]
struct DiffBuilder {
    differences: Vec<String>,
    added_files: BTreeSet<PathBuf>,
    removed_files: BTreeSet<PathBuf>,
    changed_files: BTreeSet<PathBuf>,
    changed_files_content: BTreeSet<PathBuf>,
    added_dirs: BTreeSet<PathBuf>,
    removed_dirs: BTreeSet<PathBuf>,
    changed_dirs: BTreeSet<PathBuf>,
}

impl DiffBuilder {
    fn finish(self) -> DiffReport {
        let changed = !(self.added_files.is_empty()
            && self.removed_files.is_empty()
            && self.changed_files.is_empty()
            && self.added_dirs.is_empty()
            && self.removed_dirs.is_empty()
            && self.changed_dirs.is_empty()
            && self.differences.is_empty());
        DiffReport {
            changed,
            changed_content: !self.changed_files_content.is_empty(),
            added_files: self.added_files.into_iter().collect(),
            removed_files: self.removed_files.into_iter().collect(),
            changed_files: self.changed_files.into_iter().collect(),
            changed_files_content: self.changed_files_content.into_iter().collect(),
            added_dirs: self.added_dirs.into_iter().collect(),
            removed_dirs: self.removed_dirs.into_iter().collect(),
            changed_dirs: self.changed_dirs.into_iter().collect(),
            prepared: self.differences.join("\n\n"),
        }
    }
}

/// Compares the snapshot against the filesystem as it is now.
///
/// # Errors
///
/// Returns [`StateError::Io`] when a recorded path cannot be re-examined.
pub fn diff(snapshot: &Snapshot, options: &DiffOptions) -> Result<DiffReport, StateError> {
    snapshot.validate()?;
    let mut builder = DiffBuilder::default();

    for (path, state) in &snapshot.files {
        check_file(path, state, options, &mut builder)?;
    }
    for (path, listing) in &snapshot.directories {
        check_directory(path, listing, &mut builder)?;
    }

    let report = builder.finish();
    debug!(changed = report.changed, "compared snapshot");
    Ok(report)
}

fn check_file(
    path: &Path,
    state: &FileState,
    options: &DiffOptions,
    builder: &mut DiffBuilder,
) -> Result<(), StateError> {
    let mut neg = Vec::new();
    let mut pos = Vec::new();
    let mut extra = Vec::new();

    // follows symlinks, so a now-dangling link counts as removed
    let exists = fs::metadata(path).is_ok();
    if state.exists != exists {
        neg.push(format!("-  exists: {}", state.exists));
        pos.push(format!("+  exists: {exists}"));
        if state.exists {
            builder.removed_files.insert(path.into());
        } else {
            builder.added_files.insert(path.into());
        }
    }

    if exists {
        if let Some(recorded_stat) = &state.stat {
            compare_file(path, state, recorded_stat, options, &mut neg, &mut pos, &mut extra)?;
            if !extra.is_empty() {
                builder.changed_files_content.insert(path.into());
            }
        }
    }

    if !(neg.is_empty() && pos.is_empty() && extra.is_empty()) {
        if state.exists && exists {
            builder.changed_files.insert(path.into());
        }
        let mut lines = neg;
        lines.extend(pos);
        lines.extend(extra);
        builder.differences.push(format!(
            "--- {path}\n+++ {path}\n{diffs}",
            path = path.display(),
            diffs = lines.join("\n"),
        ));
    }
    Ok(())
}

/// Compares attributes, symlink target and content of an existing file.
fn compare_file(
    path: &Path,
    state: &FileState,
    recorded_stat: &StatRecord,
    options: &DiffOptions,
    neg: &mut Vec<String>,
    pos: &mut Vec<String>,
    extra: &mut Vec<String>,
) -> Result<(), StateError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| StateError::io(path, e))?;
    let current_stat = StatRecord::from_metadata(&metadata);
    for (field, recorded, now) in recorded_stat.changed_fields(&current_stat) {
        neg.push(format!("-  {field}: {recorded}"));
        pos.push(format!("+  {field}: {now}"));
    }

    let symlink = if metadata.file_type().is_symlink() {
        Some(fs::read_link(path).map_err(|e| StateError::io(path, e))?)
    } else {
        None
    };
    if state.symlink != symlink {
        neg.push(format!("-  link: {}", link_label(state.symlink.as_deref())));
        pos.push(format!("+  link: {}", link_label(symlink.as_deref())));
    }
    if symlink.is_some() {
        return Ok(());
    }

    if !metadata.is_file() {
        let recorded_type = if state.symlink.is_some() { "link" } else { "file" };
        let current_type = if metadata.is_dir() { "directory" } else { "???" };
        neg.push(format!("-  type: {recorded_type}"));
        pos.push(format!("+  type: {current_type}"));
        return Ok(());
    }

    let content = fs::read(path).map_err(|e| StateError::io(path, e))?;
    if let Some(recorded_sha) = &state.sha256 {
        let current_sha = sha256_hex(&content);
        if &current_sha != recorded_sha {
            extra.push(format!("-  SHA-256: {recorded_sha}"));
            extra.push(format!("+  SHA-256: {current_sha}"));
        }
    }
    if let Some(encoded) = &state.content {
        let recorded_content = BASE64.decode(encoded).unwrap_or_default();
        if recorded_content != content {
            extra.push("   Content:".to_owned());
            if options.content_diff {
                let recorded_text = String::from_utf8_lossy(&recorded_content).into_owned();
                let current_text = String::from_utf8_lossy(&content).into_owned();
                let text_diff = TextDiff::from_lines(&recorded_text, &current_text);
                let unified = text_diff.unified_diff().context_radius(3).to_string();
                extra.extend(unified.lines().map(str::to_owned));
            } else {
                extra.push("-     (...)".to_owned());
                extra.push("+     (...)".to_owned());
            }
        }
    }
    Ok(())
}

fn link_label(target: Option<&Path>) -> String {
    target.map_or_else(
        || "(not a link)".to_owned(),
        |p| p.display().to_string(),
    )
}

fn check_directory(
    path: &Path,
    listing: &DirectoryState,
    builder: &mut DiffBuilder,
) -> Result<(), StateError> {
    if !fs::metadata(path).is_ok_and(|m| m.is_dir()) {
        builder.removed_dirs.insert(path.into());
        return Ok(());
    }
    let mut changed = false;

    if let Some(recorded_stat) = &listing.stat {
        let metadata = fs::symlink_metadata(path).map_err(|e| StateError::io(path, e))?;
        let current_stat = StatRecord::from_metadata(&metadata);
        let changes = recorded_stat.changed_fields(&current_stat);
        if !changes.is_empty() {
            changed = true;
            let mut neg = Vec::new();
            let mut pos = Vec::new();
            for (field, recorded, now) in changes {
                neg.push(format!("-  {field}: {recorded}"));
                pos.push(format!("+  {field}: {now}"));
            }
            neg.extend(pos);
            builder.differences.push(format!(
                "--- {path}\n+++ {path}\n{diffs}",
                path = path.display(),
                diffs = neg.join("\n"),
            ));
        }
    }

    let (current_files, current_dirs) = list_directory(path)?;

    let mut recorded_files = listing.files.clone();
    recorded_files.sort();
    let mut files_now = current_files;
    files_now.sort();
    if recorded_files != files_now {
        changed = true;
        for name in &files_now {
            if !recorded_files.contains(name) {
                builder.added_files.insert(path.join(name));
            }
        }
        let header = format!("{} (files)", path.display());
        builder
            .differences
            .push(listing_diff(&recorded_files, &files_now, &header));
    }

    if let Some(recorded) = &listing.directories {
        let mut recorded_dirs = recorded.clone();
        recorded_dirs.sort();
        let mut dirs_now = current_dirs;
        dirs_now.sort();
        if recorded_dirs != dirs_now {
            changed = true;
            for name in &recorded_dirs {
                if !dirs_now.contains(name) {
                    builder.removed_dirs.insert(path.join(name));
                }
            }
            for name in &dirs_now {
                if !recorded_dirs.contains(name) {
                    builder.added_dirs.insert(path.join(name));
                }
            }
            let header = format!("{} (dirs)", path.display());
            builder
                .differences
                .push(listing_diff(&recorded_dirs, &dirs_now, &header));
        }
    }

    if changed {
        builder.changed_dirs.insert(path.into());
    }
    Ok(())
}

/// Unified diff of two sorted name listings, labelled on both sides.
fn listing_diff(recorded: &[String], current: &[String], header: &str) -> String {
    let recorded_text = join_lines(recorded);
    let current_text = join_lines(current);
    let text_diff = TextDiff::from_lines(&recorded_text, &current_text);
    let unified = text_diff
        .unified_diff()
        .context_radius(3)
        .header(header, header)
        .to_string();
    unified.trim_end_matches('\n').to_owned()
}

fn join_lines(names: &[String]) -> String {
    let mut out = String::new();
    for name in names {
        out.push_str(name);
        out.push('\n');
    }
    out
}
