//! Manifest-level error types
//!
//! [`DirectiveError`] reports a malformed directive inside a syntactically
//! valid file. [`ManifestError`] is what parsing, loading and writing a
//! manifest return to callers.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::base::{Position, VersionError};
use crate::parser::errors::write_location;
use crate::parser::{ErrorCode, ErrorList, SyntaxError};

/// What was wrong with a directive
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveErrorKind {
    #[error("unknown directive: {0}")]
    UnknownDirective(String),
    #[error("unknown block type: {0}")]
    UnknownBlock(String),
    #[error("repeated module statement")]
    RepeatedModule,
    /// Wrong number or shape of arguments; holds the expected usage
    #[error("usage: {0}")]
    Usage(String),
    #[error("invalid quoted string: {0}")]
    InvalidQuote(String),
    #[error(transparent)]
    Version(#[from] VersionError),
    /// A replacement target that cannot be used as written
    #[error("{0}")]
    Replacement(String),
}

impl DirectiveErrorKind {
    /// The error code for this kind
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownDirective(_) => ErrorCode::E0301,
            Self::UnknownBlock(_) => ErrorCode::E0305,
            Self::RepeatedModule => ErrorCode::E0303,
            Self::Usage(_) => ErrorCode::E0302,
            Self::InvalidQuote(_) => ErrorCode::E0304,
            Self::Version(VersionError::Invalid { .. }) => ErrorCode::E0401,
            Self::Version(VersionError::InvalidModulePath { .. }) => ErrorCode::E0402,
            Self::Replacement(_) => ErrorCode::E0403,
        }
    }
}

/// A malformed directive, located in its file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveError {
    pub filename: String,
    pub pos: Position,
    /// Directive keyword, when the error concerns a specific module
    pub verb: String,
    /// Offending module path, when known
    pub module_path: String,
    pub kind: DirectiveErrorKind,
}

impl DirectiveError {
    pub fn new(filename: impl Into<String>, pos: Position, kind: DirectiveErrorKind) -> Self {
        Self {
            filename: filename.into(),
            pos,
            verb: String::new(),
            module_path: String::new(),
            kind,
        }
    }

    /// Attach the directive keyword and module path the error concerns
    pub fn with_module(mut self, verb: impl Into<String>, module_path: impl Into<String>) -> Self {
        self.verb = verb.into();
        self.module_path = module_path.into();
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.kind.code()
    }
}

impl fmt::Display for DirectiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_location(f, &self.filename, self.pos)?;
        match (self.verb.is_empty(), self.module_path.is_empty()) {
            (false, false) => write!(f, "{} {}: ", self.verb, self.module_path)?,
            (false, true) => write!(f, "{}: ", self.verb)?,
            _ => {}
        }
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for DirectiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Errors returned when reading, creating or writing a manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("{0}")]
    Syntax(ErrorList<SyntaxError>),
    #[error("{0}")]
    Directives(ErrorList<DirectiveError>),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: manifest not found", .0.display())]
    NotFound(PathBuf),
    #[error("{}: manifest already exists", .0.display())]
    AlreadyExists(PathBuf),
    #[error("{0}")]
    Validation(String),
}

impl ManifestError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<ErrorList<SyntaxError>> for ManifestError {
    fn from(errors: ErrorList<SyntaxError>) -> Self {
        Self::Syntax(errors)
    }
}

impl From<ErrorList<DirectiveError>> for ManifestError {
    fn from(errors: ErrorList<DirectiveError>) -> Self {
        Self::Directives(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::TextSize;

    fn at(line: usize, column: usize) -> Position {
        Position::new(line, column, TextSize::from(0))
    }

    #[test]
    fn test_display_with_verb_and_path() {
        let err = DirectiveError::new(
            "gno.mod",
            at(3, 1),
            VersionError::malformed("v1").into(),
        )
        .with_module("require", "gno.land/p/demo/avl");
        assert_eq!(
            err.to_string(),
            "gno.mod:3: require gno.land/p/demo/avl: version \"v1\" invalid: must be of the form v1.2.3"
        );
        assert_eq!(err.code(), ErrorCode::E0401);
    }

    #[test]
    fn test_display_without_verb() {
        let err = DirectiveError::new(
            "gno.mod",
            at(2, 5),
            DirectiveErrorKind::Usage("module module/path".into()),
        );
        assert_eq!(err.to_string(), "gno.mod:2:5: usage: module module/path");
        assert_eq!(err.code(), ErrorCode::E0302);
    }

    #[test]
    fn test_manifest_error_display() {
        let err = ManifestError::NotFound(PathBuf::from("/tmp/x/gno.mod"));
        assert_eq!(err.to_string(), "/tmp/x/gno.mod: manifest not found");

        let list: ErrorList<DirectiveError> = vec![
            DirectiveError::new("a", at(1, 1), DirectiveErrorKind::RepeatedModule),
            DirectiveError::new("a", at(2, 1), DirectiveErrorKind::UnknownDirective("go".into())),
        ]
        .into();
        assert_eq!(
            ManifestError::from(list).to_string(),
            "a:1: repeated module statement\na:2: unknown directive: go"
        );
    }
}
