//! Manifest model and editor
//!
//! Interprets the generic syntax tree from [`crate::parser`] as manifest
//! directives and edits it in place:
//! - [`ManifestFile`] - module, require, replace and exclude entries plus the tree
//! - [`DirectiveError`] - a malformed directive, with verb, module path and cause
//! - [`ManifestError`] - what parsing, loading and writing a manifest return
//!
//! Edits never renumber lines. Removed lines stay in the tree with no tokens
//! until [`ManifestFile::cleanup`] (or formatting) drops them.

mod directives;
mod editor;
mod errors;
mod manifest;

pub use errors::{DirectiveError, DirectiveErrorKind, ManifestError};
pub use manifest::{
    ExcludeEntry, ManifestFile, ModuleDirective, ReplaceEntry, RequireEntry,
    module_path_from_bytes,
};
