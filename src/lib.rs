//! # gnomod
//!
//! Core library for `gno.mod` manifests: lossless parsing, in-place editing,
//! import extraction and dependency planning.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! project   → Source discovery, imports, manifest loading, fetch planning
//!   ↓
//! syntax    → Manifest model (module/require/replace/exclude) and editor
//!   ↓
//! parser    → Logos lexer, recursive-descent parser, comment assigner, printer
//!   ↓
//! base      → Primitives (Position, quoting, module versions, constants)
//! ```

// ============================================================================
// MODULES (dependency order: base → parser → syntax → project)
// ============================================================================

/// Foundation types: Position, ModuleVersion, quoting helpers
pub mod base;

/// Parser: Logos lexer, recursive-descent parser, printer
pub mod parser;

/// Syntax: manifest directives, decoding and editing
pub mod syntax;

/// Project: source files, imports, manifests on disk, dependency resolution
pub mod project;

// Re-export foundation types
pub use base::{ModuleVersion, Position, TextSize, VersionError};

// Re-export the manifest model
pub use syntax::{ManifestError, ManifestFile};
