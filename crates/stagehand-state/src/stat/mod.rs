//! Filesystem metadata records.
//!
//! A [`StatRecord`] captures the `lstat` fields that matter for detecting
//! modifications. Access time is deliberately excluded: the snapshots exist
//! to catch changes, and merely reading a file must not count as one.

use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;

use serde::{Deserialize, Serialize};

/// Metadata of one filesystem entry, as recorded by a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRecord {
    /// Full `st_mode` bits rendered in octal (type and permissions).
    pub mode: String,
    /// Inode number.
    pub inode: u64,
    /// Device the entry lives on.
    pub dev: u64,
    /// Hard link count.
    pub nlink: u64,
    /// Owning user id.
    pub uid: u32,
    /// Owning group id.
    pub gid: u32,
    /// Size in bytes.
    pub size: u64,
    /// Modification time, seconds part.
    pub mtime: i64,
    /// Modification time, nanoseconds part.
    pub mtime_nsec: i64,
    /// Inode change time, seconds part.
    pub ctime: i64,
    /// Inode change time, nanoseconds part.
    pub ctime_nsec: i64,
    /// Allocated block count.
    pub blocks: u64,
    /// Preferred I/O block size.
    pub blksize: u64,
    /// Device id for special files.
    pub rdev: u64,
}

impl StatRecord {
    /// Extracts the record from filesystem metadata.
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            mode: format!("{:o}", metadata.mode()),
            inode: metadata.ino(),
            dev: metadata.dev(),
            nlink: metadata.nlink(),
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: metadata.size(),
            mtime: metadata.mtime(),
            mtime_nsec: metadata.mtime_nsec(),
            ctime: metadata.ctime(),
            ctime_nsec: metadata.ctime_nsec(),
            blocks: metadata.blocks(),
            blksize: metadata.blksize(),
            rdev: metadata.rdev(),
        }
    }

    /// Returns `(field, recorded, current)` for every field that differs.
    #[must_use]
    pub fn changed_fields(&self, current: &Self) -> Vec<(&'static str, String, String)> {
        let mut changes = Vec::new();
        let mut check = |field: &'static str, recorded: String, now: String| {
            if recorded != now {
                changes.push((field, recorded, now));
            }
        };
        check("mode", self.mode.clone(), current.mode.clone());
        check("inode", self.inode.to_string(), current.inode.to_string());
        check("dev", self.dev.to_string(), current.dev.to_string());
        check("nlink", self.nlink.to_string(), current.nlink.to_string());
        check("uid", self.uid.to_string(), current.uid.to_string());
        check("gid", self.gid.to_string(), current.gid.to_string());
        check("size", self.size.to_string(), current.size.to_string());
        check(
            "mtime",
            format!("{}.{:09}", self.mtime, self.mtime_nsec),
            format!("{}.{:09}", current.mtime, current.mtime_nsec),
        );
        check(
            "ctime",
            format!("{}.{:09}", self.ctime, self.ctime_nsec),
            format!("{}.{:09}", current.ctime, current.ctime_nsec),
        );
        check("blocks", self.blocks.to_string(), current.blocks.to_string());
        check(
            "blksize",
            self.blksize.to_string(),
            current.blksize.to_string(),
        );
        check("rdev", self.rdev.to_string(), current.rdev.to_string());
        changes
    }
}

#[cfg(test)]
mod tests;
