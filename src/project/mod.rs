//! Source trees and dependencies
//!
//! - [`file_loader`] - finding source files and package directories
//! - [`imports`] - reading the import declarations of source files
//! - [`workspace_loader`] - reading, creating and listing manifests
//! - [`resolver`] - planning which modules have to be fetched

mod errors;
pub mod file_loader;
pub mod imports;
pub mod resolver;
pub mod workspace_loader;

pub use errors::{ImportError, ResolutionError};
pub use file_loader::{
    dirs_from_args_recursively, files_from_args, files_from_args_recursively, is_source_file,
    packages_from_args_recursively, targets_from_patterns,
};
pub use imports::{
    ImportOptions, ImportSet, WhyReport, WhyStanza, file_imports, import_to_files,
    imports_for_packages, package_imports, source_imports,
};
pub use resolver::{
    DirectorySource, FetchPlan, ModuleSource, ResolveOptions, Resolver, VisitedSet, is_stdlib,
};
pub use workspace_loader::{
    PackageInfo, create_manifest, find_manifest_dir, list_packages, read_manifest,
};
