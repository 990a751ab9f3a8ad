//! Tests for atomic file copy operations

use frep::executor::copy::PART_SUFFIX;
use frep::executor::{copy_file, safe_copy};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn create_test_file(path: &PathBuf, content: &[u8]) {
    let mut file = fs::File::create(path).expect("Failed to create test file");
    file.write_all(content)
        .expect("Failed to write test content");
    file.flush().expect("Failed to flush");
}

fn set_file_mtime(path: &PathBuf, mtime: SystemTime) {
    let filetime_mtime = filetime::FileTime::from_system_time(mtime);
    filetime::set_file_mtime(path, filetime_mtime).expect("Failed to set mtime");
}

#[test]
fn test_copy_basic_content() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("source.txt");
    let content = b"Hello, frep! This is a test file.";
    create_test_file(&src_path, content);

    let dest_path = root.join("dest.txt");
    let bytes_copied = copy_file(&src_path, &dest_path).expect("copy_file should succeed");

    assert_eq!(bytes_copied, content.len() as u64);
    let dest_content = fs::read(&dest_path).expect("Failed to read dest file");
    assert_eq!(dest_content, content);
}

#[test]
fn test_copy_overwrites_existing() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("source.txt");
    let dest_path = root.join("dest.txt");
    create_test_file(&src_path, b"new");
    create_test_file(&dest_path, b"much older content");

    copy_file(&src_path, &dest_path).expect("copy_file should succeed");
    assert_eq!(fs::read(&dest_path).expect("read dest"), b"new");
}

#[test]
fn test_copy_preserves_mtime() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("source.txt");
    create_test_file(&src_path, b"timestamped");
    let past = SystemTime::now() - Duration::from_secs(3 * 24 * 3600);
    set_file_mtime(&src_path, past);

    let dest_path = root.join("dest.txt");
    copy_file(&src_path, &dest_path).expect("copy_file should succeed");

    let src_meta = fs::metadata(&src_path).expect("src metadata");
    let dest_meta = fs::metadata(&dest_path).expect("dest metadata");
    assert_eq!(
        filetime::FileTime::from_last_modification_time(&src_meta),
        filetime::FileTime::from_last_modification_time(&dest_meta),
        "mtime should be preserved"
    );
}

#[test]
fn test_copy_removes_part_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("source.txt");
    create_test_file(&src_path, b"content");
    let dest_path = root.join("dest.txt");

    copy_file(&src_path, &dest_path).expect("copy_file should succeed");

    let leftovers: Vec<_> = fs::read_dir(root)
        .expect("read dir")
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(PART_SUFFIX))
        .collect();
    assert!(leftovers.is_empty(), "no part file should remain");
}

#[test]
fn test_copy_large_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("large.bin");
    let content: Vec<u8> = (0..3 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
    create_test_file(&src_path, &content);

    let dest_path = root.join("large_copy.bin");
    let bytes = copy_file(&src_path, &dest_path).expect("copy_file should succeed");

    assert_eq!(bytes, content.len() as u64);
    assert_eq!(fs::read(&dest_path).expect("read dest"), content);
}

#[cfg(unix)]
#[test]
fn test_copy_preserves_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("script.sh");
    create_test_file(&src_path, b"#!/bin/sh\n");
    fs::set_permissions(&src_path, fs::Permissions::from_mode(0o750))
        .expect("set permissions");

    let dest_path = root.join("script_copy.sh");
    copy_file(&src_path, &dest_path).expect("copy_file should succeed");

    let mode = fs::metadata(&dest_path).expect("dest metadata").permissions().mode();
    assert_eq!(mode & 0o777, 0o750);
}

#[test]
fn test_safe_copy_reports_missing_source() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    assert!(!safe_copy(&root.join("absent"), &root.join("dest")));
    assert!(!root.join("dest").exists());
}

#[test]
fn test_safe_copy_missing_parent_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();
    let src_path = root.join("source.txt");
    create_test_file(&src_path, b"x");

    assert!(!safe_copy(&src_path, &root.join("no/such/dir/dest.txt")));
}
