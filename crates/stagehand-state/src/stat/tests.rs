//! Unit tests for metadata records.

use std::fs;

use tempfile::TempDir;

use super::*;

fn record_for(content: &[u8]) -> (TempDir, StatRecord) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("file");
    fs::write(&path, content).expect("write file");
    let metadata = fs::symlink_metadata(&path).expect("lstat");
    (dir, StatRecord::from_metadata(&metadata))
}

#[test]
fn records_size_and_mode() {
    let (_dir, record) = record_for(b"hello");
    assert_eq!(record.size, 5);
    // regular file bit (0o100000) is part of the full mode
    assert!(record.mode.starts_with("100"));
}

#[test]
fn identical_records_report_no_changes() {
    let (_dir, record) = record_for(b"hello");
    assert!(record.changed_fields(&record.clone()).is_empty());
}

#[test]
fn changed_size_is_reported_with_both_values() {
    let (_dir, record) = record_for(b"hello");
    let mut grown = record.clone();
    grown.size = 99;
    let changes = record.changed_fields(&grown);
    assert_eq!(changes.len(), 1);
    let (field, recorded, now) = changes.first().expect("one change");
    assert_eq!(*field, "size");
    assert_eq!(recorded, "5");
    assert_eq!(now, "99");
}

#[test]
fn rewritten_file_changes_mtime_or_inode() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("file");
    fs::write(&path, b"one").expect("write");
    let before = StatRecord::from_metadata(&fs::symlink_metadata(&path).expect("lstat"));
    fs::remove_file(&path).expect("remove");
    fs::write(&path, b"three").expect("rewrite");
    let after = StatRecord::from_metadata(&fs::symlink_metadata(&path).expect("lstat"));
    assert!(!before.changed_fields(&after).is_empty());
}
