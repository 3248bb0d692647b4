//! Foundation types for the gnomod toolchain.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`Position`] - Line/column/byte positions for tokens and syntax nodes
//! - [`ModuleVersion`] - Module coordinates and version canonicalization
//! - Quoting helpers for manifest arguments
//! - Domain constants (file names, suffixes, directive keywords)
//!
//! This module has NO dependencies on other gnomod modules.

pub mod constants;
mod position;
pub mod quote;
pub mod version;

pub use position::Position;
pub use quote::{UnquoteError, auto_quote, must_quote, quote, unquote};
pub use version::{
    ModuleVersion, VersionError, canonical_version, check_path_major, is_directory_path,
    split_path_major,
};

// Re-export text-size types for convenience
pub use text_size::{self, TextSize};
