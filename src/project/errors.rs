//! Errors raised while walking source trees and planning fetches

use std::path::PathBuf;

use thiserror::Error;

use crate::base::ModuleVersion;
use crate::syntax::ManifestError;

/// Failure to discover files or read their imports
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid file or package path: {}: {source}", .path.display())]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: walk dir: {source}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    /// A source file whose header cannot be read
    #[error("{}:{line}:{column}: {message}", .path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

impl ImportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A dependency branch that could not be planned
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// Replacements lead back to a path already on the chain
    #[error("replace cycle: {}", .chain.join(" => "))]
    Cycle { chain: Vec<String> },
    #[error("{module}: dependency depth exceeds {max_depth}")]
    TooDeep {
        module: ModuleVersion,
        max_depth: usize,
    },
    /// The module source has no such module
    #[error("{module}: cannot resolve module: {source}")]
    Unresolvable {
        module: ModuleVersion,
        #[source]
        source: ManifestError,
    },
}
