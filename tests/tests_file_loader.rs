#![allow(clippy::unwrap_used)]

//! Source file and package discovery.

use std::fs;
use std::path::{Path, PathBuf};

use gnomod::project::{
    ImportError, dirs_from_args_recursively, files_from_args, files_from_args_recursively,
    is_source_file, packages_from_args_recursively, targets_from_patterns,
};
use tempfile::TempDir;

fn touch(root: &Path, name: &str) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "package p\n").unwrap();
}

/// ```text
/// a/x.gno
/// a/b/y.gno
/// a/b/z.gno
/// a/b/.h.gno
/// c/readme.md
/// ```
fn tree() -> TempDir {
    let tmp = tempfile::tempdir().unwrap();
    for name in ["a/x.gno", "a/b/y.gno", "a/b/z.gno", "a/b/.h.gno", "c/readme.md"] {
        touch(tmp.path(), name);
    }
    tmp
}

fn under(root: &Path, names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(|n| root.join(n)).collect()
}

#[test]
fn test_is_source_file() {
    let tmp = tree();
    assert!(is_source_file(&tmp.path().join("a/x.gno")));
    assert!(!is_source_file(&tmp.path().join("a/b/.h.gno")));
    assert!(!is_source_file(&tmp.path().join("c/readme.md")));
    assert!(!is_source_file(&tmp.path().join("a")));
}

#[test]
fn test_files_from_args_lists_one_level() {
    let tmp = tree();
    let root = tmp.path();
    let files = files_from_args(&[root.join("a"), root.join("c/readme.md")]).unwrap();
    assert_eq!(files, under(root, &["a/x.gno"]));
}

#[test]
fn test_files_from_args_recursively() {
    let tmp = tree();
    let root = tmp.path();
    let files = files_from_args_recursively(&[root.join("a")]).unwrap();
    assert_eq!(files, under(root, &["a/b/y.gno", "a/b/z.gno", "a/x.gno"]));
}

#[test]
fn test_dirs_visited_once() {
    let tmp = tree();
    let root = tmp.path();
    let dirs = dirs_from_args_recursively(&[root.to_path_buf()]).unwrap();
    assert_eq!(dirs, under(root, &["a/b", "a"]));

    let packages =
        packages_from_args_recursively(&[root.to_path_buf(), root.join("c/readme.md")]).unwrap();
    assert_eq!(packages, under(root, &["a/b", "a", "c/readme.md"]));
}

#[test]
fn test_missing_argument() {
    let tmp = tree();
    let err = files_from_args(&[tmp.path().join("nope")]).unwrap_err();
    assert!(matches!(err, ImportError::InvalidPath { .. }));
    assert!(err.to_string().starts_with("invalid file or package path: "));
}

#[test]
fn test_targets_from_patterns() {
    let tmp = tree();
    let root = tmp.path().to_string_lossy().into_owned();

    let targets = targets_from_patterns(&[format!("{root}/a/...")]).unwrap();
    assert_eq!(targets, vec![format!("{root}/a/b"), format!("{root}/a")]);

    let targets = targets_from_patterns(&[format!("{root}/a/b/...")]).unwrap();
    assert_eq!(targets, vec![format!("{root}/a/b")]);

    let plain = format!("{root}/a/x.gno");
    assert_eq!(targets_from_patterns(&[plain.clone()]).unwrap(), vec![plain]);

    assert!(targets_from_patterns(&[format!("{root}/missing/...")]).is_err());
}
