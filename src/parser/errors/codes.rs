//! Error code definitions for manifest diagnostics
//!
//! Error codes follow a naming convention: E{category}{number}
//! - E01xx: Lexical errors (invalid tokens)
//! - E02xx: Structural errors (blocks, parentheses)
//! - E03xx: Directive errors (arity, quoting, unknown verbs)
//! - E04xx: Version and module path errors
//! - E09xx: Generic/fallback errors

use std::fmt;

/// Error codes for manifest diagnostics
///
/// Each error code represents a specific category of error,
/// enabling filtering and documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // E01xx: Lexical errors (invalid tokens)
    // =========================================================================
    /// Character that cannot start any token
    E0101,
    /// String literal still open at end of input
    E0102,
    /// Literal newline inside a string
    E0103,
    /// `/* */` comment
    E0104,

    // =========================================================================
    // E02xx: Structural errors
    // =========================================================================
    /// Block still open at end of input
    E0201,
    /// Tokens after a closing paren
    E0202,

    // =========================================================================
    // E03xx: Directive errors
    // =========================================================================
    /// Unknown directive keyword
    E0301,
    /// Wrong number or shape of arguments
    E0302,
    /// Second `module` statement
    E0303,
    /// Malformed quoted argument
    E0304,
    /// Block with an unknown or multi-token keyword
    E0305,

    // =========================================================================
    // E04xx: Version and module path errors
    // =========================================================================
    /// Version that is not of the form v1.2.3
    E0401,
    /// Module path with an invalid major-version suffix
    E0402,
    /// Replacement target that is neither a module nor a directory
    E0403,

    // =========================================================================
    // E09xx: Generic/fallback errors
    // =========================================================================
    /// Unexpected token in current context
    E0901,
    /// Internal parser error
    E0999,
}

impl ErrorCode {
    /// Get the string representation of the error code (e.g., "E0201")
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexical
            Self::E0101 => "E0101",
            Self::E0102 => "E0102",
            Self::E0103 => "E0103",
            Self::E0104 => "E0104",
            // Structural
            Self::E0201 => "E0201",
            Self::E0202 => "E0202",
            // Directive
            Self::E0301 => "E0301",
            Self::E0302 => "E0302",
            Self::E0303 => "E0303",
            Self::E0304 => "E0304",
            Self::E0305 => "E0305",
            // Version
            Self::E0401 => "E0401",
            Self::E0402 => "E0402",
            Self::E0403 => "E0403",
            // Generic
            Self::E0901 => "E0901",
            Self::E0999 => "E0999",
        }
    }

    /// Get a short description of the error category
    pub fn category_description(&self) -> &'static str {
        match self {
            Self::E0101 | Self::E0102 | Self::E0103 | Self::E0104 => "lexical error",
            Self::E0201 | Self::E0202 => "structural error",
            Self::E0301 | Self::E0302 | Self::E0303 | Self::E0304 | Self::E0305 => {
                "directive error"
            }
            Self::E0401 | Self::E0402 | Self::E0403 => "version error",
            Self::E0901 | Self::E0999 => "syntax error",
        }
    }

    /// Get the default message template for this error code
    pub fn default_message(&self) -> &'static str {
        match self {
            // Lexical
            Self::E0101 => "unexpected input character",
            Self::E0102 => "unexpected EOF in string",
            Self::E0103 => "unexpected newline in string",
            Self::E0104 => "mod files must use // comments (not /* */ comments)",
            // Structural
            Self::E0201 => "syntax error (unterminated block)",
            Self::E0202 => "syntax error (expected newline after closing paren)",
            // Directive
            Self::E0301 => "unknown directive",
            Self::E0302 => "wrong number of arguments",
            Self::E0303 => "repeated module statement",
            Self::E0304 => "invalid quoted string",
            Self::E0305 => "unknown block type",
            // Version
            Self::E0401 => "invalid version",
            Self::E0402 => "invalid module path",
            Self::E0403 => "invalid replacement",
            // Generic
            Self::E0901 => "unexpected token",
            Self::E0999 => "internal parser error",
        }
    }

    /// Check if this is a lexical error
    pub fn is_lexical(&self) -> bool {
        matches!(self, Self::E0101 | Self::E0102 | Self::E0103 | Self::E0104)
    }

    /// Check if this is a structural error (block-related)
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::E0201 | Self::E0202)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
