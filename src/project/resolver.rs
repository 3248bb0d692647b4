//! Dependency resolution
//!
//! Builds the ordered list of modules an external fetcher has to retrieve
//! for a set of imports. Each import is mapped to a coordinate through the
//! requiring manifest's requirements and replacements, then the dependency's
//! own manifest is consulted for its requirements, recursively.
//!
//! Failures abandon only the branch they occur on; they are collected in
//! [`FetchPlan::errors`] while sibling branches keep resolving.

use std::path::PathBuf;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::base::ModuleVersion;
use crate::base::constants::MANIFEST_FILE;
use crate::syntax::{ManifestError, ManifestFile};

use super::errors::ResolutionError;
use super::workspace_loader::read_manifest;

/// Read side of a module fetcher
pub trait ModuleSource: Sync {
    /// The manifest of `module`, or `None` when the module has none
    fn manifest(&self, module: &ModuleVersion) -> Result<Option<ManifestFile>, ManifestError>;
}

/// Modules laid out on disk as `<root>/<module path>/gno.mod`
///
/// Local coordinates are looked up relative to the same root.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn module_dir(&self, module: &ModuleVersion) -> PathBuf {
        self.root.join(&module.path)
    }
}

impl ModuleSource for DirectorySource {
    fn manifest(&self, module: &ModuleVersion) -> Result<Option<ManifestFile>, ManifestError> {
        let dir = self.module_dir(module);
        if !dir.is_dir() {
            return Err(ManifestError::NotFound(dir));
        }
        match read_manifest(&dir.join(MANIFEST_FILE)) {
            Ok(manifest) => Ok(Some(manifest)),
            Err(ManifestError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Resolved module paths already planned
///
/// Check and insert happen under one lock, so a set may be shared by
/// resolvers running on different threads.
#[derive(Debug, Default)]
pub struct VisitedSet {
    paths: Mutex<FxHashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `path`, returning false if it was already present
    pub fn insert(&self, path: &str) -> bool {
        let mut paths = self.paths.lock();
        if paths.contains(path) {
            return false;
        }
        paths.insert(path.to_string())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.lock().contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.lock().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Record directory replacements without reading their manifests
    pub skip_local: bool,
    /// Apply replacements to the targets of replacements
    pub follow_replace_chains: bool,
    pub max_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            skip_local: true,
            follow_replace_chains: true,
            max_depth: 64,
        }
    }
}

/// What a fetcher has to retrieve
#[derive(Debug, Default)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct FetchPlan {
    /// Modules to fetch, in discovery order
    pub modules: Vec<ModuleVersion>,
    /// Directory replacements; never fetched
    pub local: Vec<ModuleVersion>,
    /// Branches that were abandoned
    #[cfg_attr(feature = "interchange", serde(skip))]
    pub errors: Vec<ResolutionError>,
}

impl FetchPlan {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    #[cfg(feature = "interchange")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Whether an import path belongs to the standard library
pub fn is_stdlib(import: &str) -> bool {
    !import.contains('.')
}

/// The requirement covering `import`: the longest required module path that
/// equals it or is a directory prefix of it
fn covering_require<'m>(manifest: &'m ManifestFile, import: &str) -> Option<&'m ModuleVersion> {
    manifest
        .requires
        .iter()
        .map(|r| &r.module)
        .filter(|m| {
            import == m.path
                || import
                    .strip_prefix(m.path.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
        .max_by_key(|m| m.path.len())
}

pub struct Resolver<'a, S: ModuleSource + ?Sized> {
    source: &'a S,
    visited: &'a VisitedSet,
    options: ResolveOptions,
}

impl<'a, S: ModuleSource + ?Sized> Resolver<'a, S> {
    pub fn new(source: &'a S, visited: &'a VisitedSet, options: ResolveOptions) -> Self {
        Self {
            source,
            visited,
            options,
        }
    }

    /// Plan the fetches needed by `imports` of a package governed by `root`
    pub fn plan_imports<I: AsRef<str>>(&self, root: &ManifestFile, imports: &[I]) -> FetchPlan {
        let mut plan = FetchPlan::default();
        for import in imports {
            let import = import.as_ref();
            if is_stdlib(import) {
                tracing::trace!(import, "skipping standard library import");
                continue;
            }
            let module = covering_require(root, import)
                .cloned()
                .unwrap_or_else(|| ModuleVersion::unversioned(import));
            self.visit(root, &module, 0, &mut plan);
        }
        plan
    }

    /// Plan the fetches needed by every requirement of `manifest`
    pub fn plan_module(&self, manifest: &ManifestFile) -> FetchPlan {
        let mut plan = FetchPlan::default();
        for r in &manifest.requires {
            self.visit(manifest, &r.module, 0, &mut plan);
        }
        plan
    }

    /// Apply `manifest`'s replacements to `module`
    fn follow(
        &self,
        manifest: &ManifestFile,
        module: &ModuleVersion,
    ) -> Result<ModuleVersion, ResolutionError> {
        let mut target = manifest.resolve(module);
        if !self.options.follow_replace_chains {
            return Ok(target);
        }
        let mut chain = vec![module.clone()];
        while chain.last() != Some(&target) && !target.is_local() {
            if chain.contains(&target) {
                chain.push(target);
                return Err(ResolutionError::Cycle {
                    chain: chain.iter().map(ToString::to_string).collect(),
                });
            }
            let next = manifest.resolve(&target);
            chain.push(target);
            target = next;
        }
        Ok(target)
    }

    fn visit(
        &self,
        manifest: &ManifestFile,
        module: &ModuleVersion,
        depth: usize,
        plan: &mut FetchPlan,
    ) {
        if depth > self.options.max_depth {
            tracing::warn!(%module, depth, "dependency too deep, abandoning branch");
            plan.errors.push(ResolutionError::TooDeep {
                module: module.clone(),
                max_depth: self.options.max_depth,
            });
            return;
        }

        let target = match self.follow(manifest, module) {
            Ok(target) => target,
            Err(err) => {
                tracing::warn!(%module, error = %err, "abandoning branch");
                plan.errors.push(err);
                return;
            }
        };

        if target.is_local() {
            if !plan.local.contains(&target) {
                tracing::debug!(%module, local = %target, "local replacement");
                plan.local.push(target.clone());
            }
            if self.options.skip_local {
                return;
            }
        }

        if !self.visited.insert(&target.path) {
            tracing::trace!(%target, "already planned");
            return;
        }
        if !target.is_local() {
            tracing::debug!(%target, depth, "planned");
            plan.modules.push(target.clone());
        }

        match self.source.manifest(&target) {
            Ok(Some(dependency)) => {
                for r in &dependency.requires {
                    self.visit(&dependency, &r.module, depth + 1, plan);
                }
            }
            Ok(None) => {}
            Err(source) => {
                tracing::warn!(%target, error = %source, "cannot resolve module");
                plan.errors.push(ResolutionError::Unresolvable {
                    module: target,
                    source,
                });
            }
        }
    }
}
