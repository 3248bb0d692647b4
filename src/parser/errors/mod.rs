//! Parser error handling module
//!
//! This module provides error handling for the manifest lexer and parser:
//! - Categorized error codes for filtering and documentation
//! - Position-carrying syntax errors
//! - Ordered error lists returned at the parse boundary

mod codes;
mod error;

pub use codes::ErrorCode;
pub(crate) use error::write_location;
pub use error::{ErrorList, SyntaxError};
