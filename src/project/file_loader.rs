//! Source file discovery
//!
//! Arguments name files or directories. Files are taken as given when they
//! are source files; directories are either listed (immediate children only)
//! or walked recursively, visiting each directory holding source files once.
//! Relative results keep a `./` prefix.

use std::path::{Component, Path, PathBuf};

use regex::Regex;
use rustc_hash::FxHashSet;
use walkdir::WalkDir;

use crate::base::constants::SOURCE_EXTENSION;

use super::errors::ImportError;

/// Whether `name` names a visible source file
pub fn is_source_name(name: &str) -> bool {
    !name.starts_with('.')
        && Path::new(name)
            .extension()
            .is_some_and(|ext| ext == SOURCE_EXTENSION)
}

/// Whether `path` is a visible source file (directories never are)
pub fn is_source_file(path: &Path) -> bool {
    !path.is_dir()
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_source_name)
}

/// Prefix a relative path with `./`
pub(crate) fn ensure_path_prefix(path: &Path) -> PathBuf {
    match path.components().next() {
        Some(Component::RootDir | Component::Prefix(_) | Component::CurDir | Component::ParentDir) => {
            path.to_path_buf()
        }
        _ => Path::new(".").join(path),
    }
}

fn stat(path: &Path) -> Result<std::fs::Metadata, ImportError> {
    std::fs::metadata(path).map_err(|source| ImportError::InvalidPath {
        path: path.to_path_buf(),
        source,
    })
}

/// Source files directly inside `dir`, in name order
pub(crate) fn read_source_files(dir: &Path) -> Result<Vec<PathBuf>, ImportError> {
    let entries = std::fs::read_dir(dir).map_err(|err| ImportError::io(dir, err))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| ImportError::io(dir, err))?;
        let path = entry.path();
        if is_source_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Call `visit` once for every directory under `root` holding a source file
fn walk_source_dirs(root: &Path, mut visit: impl FnMut(&Path)) -> Result<(), ImportError> {
    let mut visited: FxHashSet<PathBuf> = FxHashSet::default();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| ImportError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_dir() || !is_source_file(entry.path()) {
            continue;
        }
        let Some(parent) = entry.path().parent() else {
            continue;
        };
        if visited.insert(parent.to_path_buf()) {
            visit(parent);
        }
    }
    Ok(())
}

/// Source files named by `args`, listing directories one level deep
pub fn files_from_args<P: AsRef<Path>>(args: &[P]) -> Result<Vec<PathBuf>, ImportError> {
    let mut paths = Vec::new();
    for arg in args {
        let arg = arg.as_ref();
        if !stat(arg)?.is_dir() {
            if is_source_file(arg) {
                paths.push(ensure_path_prefix(arg));
            }
            continue;
        }
        for file in read_source_files(arg)? {
            paths.push(ensure_path_prefix(&file));
        }
    }
    Ok(paths)
}

/// Source files named by `args`, walking directories recursively
pub fn files_from_args_recursively<P: AsRef<Path>>(
    args: &[P],
) -> Result<Vec<PathBuf>, ImportError> {
    let mut paths = Vec::new();
    for arg in args {
        let arg = arg.as_ref();
        if !stat(arg)?.is_dir() {
            if is_source_file(arg) {
                paths.push(ensure_path_prefix(arg));
            }
            continue;
        }
        let mut dirs = Vec::new();
        walk_source_dirs(arg, |dir| dirs.push(dir.to_path_buf()))?;
        for dir in dirs {
            // a directory that vanished mid-walk has nothing to contribute
            let Ok(files) = read_source_files(&dir) else {
                continue;
            };
            paths.extend(files.iter().map(|f| ensure_path_prefix(f)));
        }
    }
    Ok(paths)
}

/// Directories holding source files under `args`; file arguments are kept
/// when they are source files
pub fn dirs_from_args_recursively<P: AsRef<Path>>(
    args: &[P],
) -> Result<Vec<PathBuf>, ImportError> {
    let mut paths = Vec::new();
    for arg in args {
        let arg = arg.as_ref();
        if !stat(arg)?.is_dir() {
            if is_source_file(arg) {
                paths.push(ensure_path_prefix(arg));
            }
            continue;
        }
        walk_source_dirs(arg, |dir| paths.push(ensure_path_prefix(dir)))?;
    }
    Ok(paths)
}

/// Package directories under `args`; file arguments are kept as given
pub fn packages_from_args_recursively<P: AsRef<Path>>(
    args: &[P],
) -> Result<Vec<PathBuf>, ImportError> {
    let mut paths = Vec::new();
    for arg in args {
        let arg = arg.as_ref();
        if !stat(arg)?.is_dir() {
            paths.push(ensure_path_prefix(arg));
            continue;
        }
        walk_source_dirs(arg, |dir| paths.push(ensure_path_prefix(dir)))?;
    }
    Ok(paths)
}

/// Compile a target pattern where `...` matches any string
///
/// `foo/...` also matches `foo` itself.
fn match_pattern(pattern: &str) -> Result<Regex, ImportError> {
    let mut re = regex::escape(pattern).replace(r"\.\.\.", ".*");
    if let Some(prefix) = re.strip_suffix("/.*") {
        re = format!("{prefix}(/.*)?");
    }
    Regex::new(&format!("^{re}$")).map_err(|source| ImportError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Expand target patterns
///
/// A pattern without `/...`, or one naming a file, is returned as given. A
/// `dir/...` pattern expands to every directory under `dir` that holds a
/// source file and matches the pattern.
pub fn targets_from_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<String>, ImportError> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let wildcard = pattern.find("/...");
        let search = wildcard.map_or(pattern, |i| &pattern[..i]);

        let info = stat(Path::new(search))?;
        if wildcard.is_none() || !info.is_dir() {
            paths.push(pattern.to_string());
            continue;
        }

        let matcher = match_pattern(pattern.strip_prefix("./").unwrap_or(pattern))?;
        walk_source_dirs(Path::new(search), |dir| {
            let dir = dir.to_string_lossy();
            let dir = dir.strip_prefix("./").unwrap_or(&dir);
            if matcher.is_match(dir) {
                paths.push(dir.to_string());
            }
        })?;
    }
    Ok(paths)
}
