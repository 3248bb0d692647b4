//! The manifest model
//!
//! A [`ManifestFile`] pairs typed directive entries with the syntax tree they
//! were decoded from. Entries refer to their lines by [`LineId`], so editing
//! an entry edits the tree in place and formatting the file reflects every
//! change with comments and layout preserved.

use std::path::Path;

use rustc_hash::FxHashSet;

use crate::base::constants::{MANIFEST_FILE, MODULE_VERB};
use crate::base::{ModuleVersion, unquote};
use crate::parser::{self, FileSyntax, LineId};

use super::directives::Decoder;
use super::errors::ManifestError;

/// The `module` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDirective {
    pub path: String,
    /// Deprecation message from the directive's comments, empty if none
    pub deprecated: String,
    pub syntax: LineId,
}

/// A `require` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireEntry {
    pub module: ModuleVersion,
    /// Marked with an `// indirect` comment
    pub indirect: bool,
    pub syntax: LineId,
}

/// A `replace` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceEntry {
    /// The replaced coordinate; an empty version matches every version
    pub old: ModuleVersion,
    pub new: ModuleVersion,
    pub syntax: LineId,
}

/// An `exclude` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludeEntry {
    pub module: ModuleVersion,
    pub syntax: LineId,
}

/// A parsed manifest and the syntax tree it owns
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManifestFile {
    pub module: Option<ModuleDirective>,
    pub requires: Vec<RequireEntry>,
    pub replaces: Vec<ReplaceEntry>,
    pub excludes: Vec<ExcludeEntry>,
    /// The module is a draft and cannot be depended upon
    pub draft: bool,
    pub syntax: FileSyntax,
}

impl ManifestFile {
    /// A fresh manifest declaring `module_path`, as written by `init`
    pub fn new(module_path: &str) -> Self {
        let mut file = Self {
            syntax: FileSyntax::new(MANIFEST_FILE),
            ..Self::default()
        };
        file.set_module(module_path);
        file
    }

    /// Parse manifest bytes
    ///
    /// Syntax errors are reported before any directive is decoded; directive
    /// errors are collected over the whole file.
    pub fn parse(filename: &str, data: &[u8]) -> Result<Self, ManifestError> {
        let syntax = parser::parse_bytes(filename, data)?;
        Self::from_syntax(syntax)
    }

    pub fn parse_str(filename: &str, source: &str) -> Result<Self, ManifestError> {
        Self::parse(filename, source.as_bytes())
    }

    /// Decode the directives of an already parsed tree
    pub fn from_syntax(syntax: FileSyntax) -> Result<Self, ManifestError> {
        let mut file = Self {
            syntax,
            ..Self::default()
        };
        let errors = Decoder::new(&mut file).run();
        tracing::debug!(
            file = %file.syntax.name,
            requires = file.requires.len(),
            replaces = file.replaces.len(),
            excludes = file.excludes.len(),
            errors = errors.len(),
            "decoded manifest"
        );
        errors.into_result(file).map_err(ManifestError::from)
    }

    /// The declared module path, empty when there is none
    pub fn module_path(&self) -> &str {
        self.module.as_ref().map_or("", |m| m.path.as_str())
    }

    /// The module's deprecation message, empty when not deprecated
    pub fn deprecated(&self) -> &str {
        self.module.as_ref().map_or("", |m| m.deprecated.as_str())
    }

    /// The requirement for `path`, if any
    pub fn require(&self, path: &str) -> Option<&RequireEntry> {
        self.requires.iter().find(|r| r.module.path == path)
    }

    /// Check that the manifest declares a usable module path
    pub fn validate(&self) -> Result<(), ManifestError> {
        match &self.module {
            None => Err(ManifestError::Validation("requires module".to_string())),
            Some(m) if m.path.is_empty() => {
                Err(ManifestError::Validation("module path must not be empty".to_string()))
            }
            Some(_) => Ok(()),
        }
    }

    /// Drop duplicate directives
    ///
    /// A later requirement for the same path wins, as does a later
    /// replacement of the same coordinate; the first of identical excludes
    /// is kept.
    pub fn sanitize(&mut self) {
        let mut kill: FxHashSet<LineId> = FxHashSet::default();

        {
            let mut seen = FxHashSet::default();
            for r in self.requires.iter().rev() {
                if !seen.insert(r.module.path.as_str()) {
                    kill.insert(r.syntax);
                }
            }
        }
        {
            let mut seen = FxHashSet::default();
            for r in self.replaces.iter().rev() {
                if !seen.insert(&r.old) {
                    kill.insert(r.syntax);
                }
            }
        }
        {
            let mut seen = FxHashSet::default();
            for x in &self.excludes {
                if !seen.insert(&x.module) {
                    kill.insert(x.syntax);
                }
            }
        }

        if !kill.is_empty() {
            tracing::debug!(file = %self.syntax.name, removed = kill.len(), "dropping duplicate directives");
        }
        for &id in &kill {
            self.syntax.mark_removed(id);
        }
        self.requires.retain(|r| !kill.contains(&r.syntax));
        self.replaces.retain(|r| !kill.contains(&r.syntax));
        self.excludes.retain(|x| !kill.contains(&x.syntax));
        self.cleanup();
    }

    /// Render the manifest, dropping removed lines first
    pub fn format(&mut self) -> String {
        self.cleanup();
        parser::format(&self.syntax)
    }

    /// Format the manifest and write it to `path`
    pub fn write(&mut self, path: &Path) -> Result<(), ManifestError> {
        let text = self.format();
        std::fs::write(path, text).map_err(|err| ManifestError::io(path, err))?;
        tracing::debug!(path = %path.display(), module = self.module_path(), "wrote manifest");
        Ok(())
    }

    /// The coordinate `module` resolves to after replacements
    ///
    /// A replacement of the exact coordinate wins over one that applies to
    /// every version of the path. Without a match the input is returned.
    pub fn resolve(&self, module: &ModuleVersion) -> ModuleVersion {
        let exact = self
            .replaces
            .iter()
            .find(|r| r.old.path == module.path && !r.old.version.is_empty() && r.old.version == module.version);
        let any = || {
            self.replaces
                .iter()
                .find(|r| r.old.path == module.path && r.old.version.is_empty())
        };
        exact
            .or_else(any)
            .map_or_else(|| module.clone(), |r| r.new.clone())
    }
}

/// Find the module path in manifest bytes without parsing the whole file
///
/// Returns an empty string when no well-formed `module` line is present.
pub fn module_path_from_bytes(data: &[u8]) -> String {
    let text = String::from_utf8_lossy(data);
    for line in text.split('\n') {
        let line = line.split("//").next().unwrap_or_default().trim();
        let Some(rest) = line.strip_prefix(MODULE_VERB) else {
            continue;
        };
        let path = rest.trim();
        if path.len() == rest.len() || path.is_empty() {
            continue;
        }
        if path.starts_with(['"', '`']) {
            return unquote(path).unwrap_or_default();
        }
        return path.to_string();
    }
    String::new()
}
