use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::base::constants::MANIFEST_FILE;
use crate::syntax::{ManifestError, ManifestFile};

use super::errors::ImportError;
use super::imports::{ImportOptions, package_imports};

/// Read and parse the manifest at `path`
///
/// The path is used as the file name in error positions.
pub fn read_manifest(path: &Path) -> Result<ManifestFile, ManifestError> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ManifestError::NotFound(path.to_path_buf()));
        }
        Err(err) => return Err(ManifestError::io(path, err)),
    };
    let manifest = ManifestFile::parse(&path.to_string_lossy(), &data)?;
    tracing::debug!(path = %path.display(), module = manifest.module_path(), "read manifest");
    Ok(manifest)
}

/// The closest directory at or above `start` holding a manifest
pub fn find_manifest_dir(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(MANIFEST_FILE).is_file())
        .map(Path::to_path_buf)
}

/// Write a fresh manifest declaring `module_path` into `dir`
pub fn create_manifest(dir: &Path, module_path: &str) -> Result<ManifestFile, ManifestError> {
    let path = dir.join(MANIFEST_FILE);
    if path.exists() {
        return Err(ManifestError::AlreadyExists(path));
    }
    if module_path.is_empty() {
        return Err(ManifestError::Validation(
            "cannot determine module path".to_string(),
        ));
    }
    let mut manifest = ManifestFile::new(module_path);
    manifest.write(&path)?;
    Ok(manifest)
}

/// A directory holding a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub dir: PathBuf,
    pub module_path: String,
    pub draft: bool,
    /// Sorted imports of the package's own source files
    pub imports: Vec<String>,
}

/// Every package under `root`, in directory name order
pub fn list_packages(root: &Path) -> Result<Vec<PackageInfo>, ImportError> {
    let mut packages = Vec::new();
    let options = ImportOptions::default();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| ImportError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() || entry.file_name() != MANIFEST_FILE {
            continue;
        }
        let Some(dir) = entry.path().parent() else {
            continue;
        };
        let manifest = read_manifest(entry.path())?;
        packages.push(PackageInfo {
            dir: dir.to_path_buf(),
            module_path: manifest.module_path().to_string(),
            draft: manifest.draft,
            imports: package_imports(dir, &options)?,
        });
    }
    tracing::debug!(root = %root.display(), count = packages.len(), "listed packages");
    Ok(packages)
}
