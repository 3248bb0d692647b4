#![allow(clippy::unwrap_used)]

//! Fetch planning over a module cache laid out on disk.

use std::fs;
use std::path::Path;

use gnomod::project::{
    DirectorySource, ResolutionError, ResolveOptions, Resolver, VisitedSet, read_manifest,
};
use gnomod::{ManifestFile, ModuleVersion};
use rstest::rstest;
use tempfile::TempDir;

fn module(root: &Path, path: &str, manifest: Option<&str>) {
    let dir = root.join(path);
    fs::create_dir_all(&dir).unwrap();
    if let Some(text) = manifest {
        fs::write(dir.join("gno.mod"), text).unwrap();
    }
}

/// ```text
/// gno.land/p/demo/a   requires b and c
/// gno.land/p/demo/b   requires c
/// gno.land/p/demo/c   no manifest
/// ```
fn cache() -> TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    module(
        root,
        "gno.land/p/demo/a",
        Some("module gno.land/p/demo/a\n\nrequire (\n\tgno.land/p/demo/b v1.0.0\n\tgno.land/p/demo/c v1.0.0\n)\n"),
    );
    module(
        root,
        "gno.land/p/demo/b",
        Some("module gno.land/p/demo/b\n\nrequire gno.land/p/demo/c v1.0.0\n"),
    );
    module(root, "gno.land/p/demo/c", None);
    tmp
}

fn root_manifest(text: &str) -> ManifestFile {
    ManifestFile::parse_str("gno.mod", text).unwrap()
}

fn paths(modules: &[ModuleVersion]) -> Vec<&str> {
    modules.iter().map(|m| m.path.as_str()).collect()
}

#[test]
fn test_plan_in_discovery_order() {
    let tmp = cache();
    let source = DirectorySource::new(tmp.path());
    let visited = VisitedSet::new();
    let resolver = Resolver::new(&source, &visited, ResolveOptions::default());
    let root = root_manifest("module gno.land/r/demo/app\n\nrequire gno.land/p/demo/a v1.0.0\n");

    let plan = resolver.plan_imports(&root, &["std", "strings", "gno.land/p/demo/a/sub"]);
    assert!(plan.is_complete(), "{:?}", plan.errors);
    assert_eq!(
        paths(&plan.modules),
        vec!["gno.land/p/demo/a", "gno.land/p/demo/b", "gno.land/p/demo/c"]
    );
    assert_eq!(visited.len(), 3);
}

#[test]
fn test_visited_set_is_shared_between_runs() {
    let tmp = cache();
    let source = DirectorySource::new(tmp.path());
    let visited = VisitedSet::new();
    let resolver = Resolver::new(&source, &visited, ResolveOptions::default());

    let first = resolver.plan_imports(&root_manifest("module x.land/one\n"), &["gno.land/p/demo/b"]);
    let second = resolver.plan_imports(&root_manifest("module x.land/two\n"), &["gno.land/p/demo/a"]);
    assert_eq!(paths(&first.modules), vec!["gno.land/p/demo/b", "gno.land/p/demo/c"]);
    assert_eq!(paths(&second.modules), vec!["gno.land/p/demo/a"]);
}

#[rstest]
#[case::two_step("replace (\n\tx.land/a => x.land/b v1.0.0\n\tx.land/b => x.land/a v1.0.0\n)\n")]
#[case::three_step(
    "replace (\n\tx.land/a => x.land/b v1.0.0\n\tx.land/b => x.land/c v1.0.0\n\tx.land/c => x.land/a v1.0.0\n)\n"
)]
fn test_replace_cycle_terminates(#[case] replaces: &str) {
    let tmp = cache();
    let source = DirectorySource::new(tmp.path());
    let visited = VisitedSet::new();
    let resolver = Resolver::new(&source, &visited, ResolveOptions::default());
    let root = root_manifest(&format!("module gno.land/r/demo/app\n\n{replaces}"));

    let plan = resolver.plan_imports(&root, &["x.land/a", "gno.land/p/demo/c"]);
    assert_eq!(paths(&plan.modules), vec!["gno.land/p/demo/c"]);
    assert_eq!(plan.errors.len(), 1);
    let ResolutionError::Cycle { chain } = &plan.errors[0] else {
        panic!("expected a cycle, got {}", plan.errors[0]);
    };
    assert_eq!(chain.first().map(String::as_str), Some("x.land/a"));
}

#[test]
fn test_replacement_chain_is_followed() {
    let tmp = cache();
    let source = DirectorySource::new(tmp.path());
    let visited = VisitedSet::new();
    let root = root_manifest(
        "module gno.land/r/demo/app\n\nrequire x.land/old v1.0.0\n\nreplace (\n\tx.land/old => x.land/mid v1.0.0\n\tx.land/mid => gno.land/p/demo/b v1.0.0\n)\n",
    );

    let plan = Resolver::new(&source, &visited, ResolveOptions::default()).plan_module(&root);
    assert_eq!(paths(&plan.modules), vec!["gno.land/p/demo/b", "gno.land/p/demo/c"]);

    let visited = VisitedSet::new();
    let options = ResolveOptions {
        follow_replace_chains: false,
        ..ResolveOptions::default()
    };
    let plan = Resolver::new(&source, &visited, options).plan_module(&root);
    assert_eq!(paths(&plan.modules), vec!["x.land/mid"]);
    assert!(matches!(
        plan.errors.as_slice(),
        [ResolutionError::Unresolvable { .. }]
    ));
}

#[test]
fn test_missing_module_abandons_only_its_branch() {
    let tmp = cache();
    let source = DirectorySource::new(tmp.path());
    let visited = VisitedSet::new();
    let resolver = Resolver::new(&source, &visited, ResolveOptions::default());
    let root = root_manifest(
        "module gno.land/r/demo/app\n\nrequire (\n\tgno.land/p/demo/missing v1.0.0\n\tgno.land/p/demo/b v1.0.0\n)\n",
    );

    let plan = resolver.plan_module(&root);
    assert_eq!(
        paths(&plan.modules),
        vec!["gno.land/p/demo/missing", "gno.land/p/demo/b", "gno.land/p/demo/c"]
    );
    assert_eq!(plan.errors.len(), 1);
    assert!(plan.errors[0].to_string().starts_with("gno.land/p/demo/missing@v1.0.0: cannot resolve module"));
}

#[test]
fn test_local_replacement_is_not_fetched() {
    let tmp = cache();
    let source = DirectorySource::new(tmp.path());
    let visited = VisitedSet::new();
    let resolver = Resolver::new(&source, &visited, ResolveOptions::default());
    let root = root_manifest(
        "module gno.land/r/demo/app\n\nrequire gno.land/p/demo/a v1.0.0\n\nreplace gno.land/p/demo/a => ./gno.land/p/demo/b\n",
    );

    let plan = resolver.plan_module(&root);
    assert!(plan.modules.is_empty());
    assert_eq!(paths(&plan.local), vec!["./gno.land/p/demo/b"]);

    let visited = VisitedSet::new();
    let options = ResolveOptions {
        skip_local: false,
        ..ResolveOptions::default()
    };
    let plan = Resolver::new(&source, &visited, options).plan_module(&root);
    assert_eq!(paths(&plan.local), vec!["./gno.land/p/demo/b"]);
    assert_eq!(paths(&plan.modules), vec!["gno.land/p/demo/c"]);
}

#[test]
fn test_directory_source_reads_manifest() {
    let tmp = cache();
    let manifest = read_manifest(&tmp.path().join("gno.land/p/demo/b/gno.mod")).unwrap();
    assert_eq!(manifest.module_path(), "gno.land/p/demo/b");
}
