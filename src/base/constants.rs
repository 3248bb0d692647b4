//! Domain constants shared across the crate.

/// File name of a module manifest
pub const MANIFEST_FILE: &str = "gno.mod";

/// Extension of source files (without the dot)
pub const SOURCE_EXTENSION: &str = "gno";

/// Suffix of unit-test source files
pub const TEST_FILE_SUFFIX: &str = "_test.gno";

/// Suffix of file-test source files, which are not part of a package
pub const FILETEST_SUFFIX: &str = "_filetest.gno";

/// Paragraph prefix marking a module as deprecated
pub const DEPRECATED_MARKER: &str = "Deprecated:";

/// Single-word leading comment marking a module as a draft
pub const DRAFT_MARKER: &str = "Draft";

/// Suffix comment marking a requirement as indirect
pub const INDIRECT_MARKER: &str = "indirect";

/// Manifest directive keywords
pub const MODULE_VERB: &str = "module";
pub const REQUIRE_VERB: &str = "require";
pub const REPLACE_VERB: &str = "replace";
pub const EXCLUDE_VERB: &str = "exclude";

/// Separator between the old and new side of a replace directive
pub const REPLACE_ARROW: &str = "=>";
