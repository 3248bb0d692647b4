//! Comment-preserving edits
//!
//! Tree edits work on lines in place: an updated line keeps its comments, a
//! removed line only loses its tokens and end-of-line comments until
//! [`FileSyntax::cleanup`] drops it from the statement list. Entries of a
//! [`ManifestFile`] keep pointing at valid lines for the whole edit session.

use smol_str::SmolStr;

use crate::base::constants::{
    DRAFT_MARKER, EXCLUDE_VERB, INDIRECT_MARKER, MODULE_VERB, REPLACE_ARROW, REPLACE_VERB, REQUIRE_VERB,
};
use crate::base::{
    ModuleVersion, Position, VersionError, auto_quote, canonical_version, check_path_major,
    split_path_major,
};
use crate::parser::{Comment, CommentBlock, Comments, FileSyntax, Line, LineBlock, LineId, Stmt};

use super::directives::{is_indirect, parse_draft};
use super::manifest::{ExcludeEntry, ManifestFile, ModuleDirective, ReplaceEntry, RequireEntry};

/// Where a new line goes relative to an existing node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Line(LineId),
    Block(usize),
}

enum Placement {
    /// New top-level line after statement `i`
    After(usize),
    /// Turn top-level line statement `i` into a block, then append
    Convert(usize, LineId),
    /// Append to block statement `i`
    Append(usize),
    /// Insert into block statement `i` at position `j`
    Insert(usize, usize),
}

impl FileSyntax {
    /// Add a line holding `tokens` (directive keyword first)
    ///
    /// With a `hint` whose keyword matches, the line joins the hint's block,
    /// turning a lone hint line into a block first. A hint with another
    /// keyword places the line right after the hint's statement. Without a
    /// hint the line goes into the last statement with the same keyword, or
    /// at the end of the file.
    pub fn add_line(&mut self, hint: Option<LineId>, tokens: Vec<SmolStr>) -> LineId {
        let Some(verb) = tokens.first().cloned() else {
            return self.push_line(tokens);
        };
        let anchor = hint.map(Anchor::Line).or_else(|| self.last_with_verb(&verb));
        let Some(placement) = anchor.and_then(|anchor| self.placement(anchor, &verb)) else {
            return self.push_line(tokens);
        };

        let args = tokens[1..].to_vec();
        match placement {
            Placement::After(i) => {
                let id = self.alloc_line(Line::new(tokens, false));
                self.stmts.insert(i + 1, Stmt::Line(id));
                id
            }
            Placement::Convert(i, hint) => {
                let line = self.line_mut(hint);
                line.in_block = true;
                let head = line.tokens.remove(0);
                let id = self.alloc_line(Line::new(args, true));
                self.stmts[i] = Stmt::Block(LineBlock {
                    tokens: vec![head],
                    lines: vec![hint, id],
                    ..LineBlock::default()
                });
                id
            }
            Placement::Append(i) => {
                let id = self.alloc_line(Line::new(args, true));
                if let Stmt::Block(block) = &mut self.stmts[i] {
                    block.lines.push(id);
                }
                id
            }
            Placement::Insert(i, j) => {
                let id = self.alloc_line(Line::new(args, true));
                if let Stmt::Block(block) = &mut self.stmts[i] {
                    block.lines.insert(j, id);
                }
                id
            }
        }
    }

    fn push_line(&mut self, tokens: Vec<SmolStr>) -> LineId {
        let id = self.alloc_line(Line::new(tokens, false));
        self.stmts.push(Stmt::Line(id));
        id
    }

    /// The last statement whose keyword is `verb`
    fn last_with_verb(&self, verb: &str) -> Option<Anchor> {
        self.stmts.iter().enumerate().rev().find_map(|(i, stmt)| match stmt {
            Stmt::Line(id) if self.line(*id).tokens.first().is_some_and(|t| t == verb) => {
                Some(Anchor::Line(*id))
            }
            Stmt::Block(block) if block.verb() == verb => Some(Anchor::Block(i)),
            _ => None,
        })
    }

    fn placement(&self, anchor: Anchor, verb: &str) -> Option<Placement> {
        for (i, stmt) in self.stmts.iter().enumerate() {
            match stmt {
                Stmt::Line(id) if anchor == Anchor::Line(*id) => {
                    let matches = self.line(*id).tokens.first().is_some_and(|t| t == verb);
                    return Some(if matches {
                        Placement::Convert(i, *id)
                    } else {
                        Placement::After(i)
                    });
                }
                Stmt::Block(block) => {
                    let position = match anchor {
                        Anchor::Block(b) if b == i => Some(block.lines.len()),
                        Anchor::Line(hint) => block
                            .lines
                            .iter()
                            .position(|id| *id == hint)
                            .map(|j| j + 1),
                        Anchor::Block(_) => None,
                    };
                    let Some(j) = position else {
                        continue;
                    };
                    return Some(if block.verb() != verb {
                        Placement::After(i)
                    } else if j == block.lines.len() {
                        Placement::Append(i)
                    } else {
                        Placement::Insert(i, j)
                    });
                }
                _ => {}
            }
        }
        None
    }

    /// Replace the tokens of line `id`; `tokens` starts with the keyword,
    /// which lines inside a block omit
    pub fn update_line(&mut self, id: LineId, tokens: Vec<SmolStr>) {
        let line = self.line_mut(id);
        let skip = usize::from(line.in_block);
        line.tokens = tokens.into_iter().skip(skip).collect();
    }

    /// Mark line `id` for removal by the next cleanup
    pub fn mark_removed(&mut self, id: LineId) {
        let line = self.line_mut(id);
        line.tokens.clear();
        line.comments.suffix.clear();
    }

    /// Drop removed lines from the statement list
    ///
    /// Only blocks emptied by removals disappear, and only when no comments
    /// precede their closing paren. A block that lost lines and has a single
    /// line left becomes a plain line again under the same condition. Blocks
    /// that were empty or held only comments are kept as written.
    pub fn cleanup(&mut self) {
        let stmts = std::mem::take(&mut self.stmts);
        for stmt in stmts {
            match stmt {
                Stmt::Line(id) if self.line(id).is_removed() => {}
                Stmt::Block(mut block) => {
                    let before = block.lines.len();
                    block.lines.retain(|id| !self.line(*id).is_removed());
                    let shrunk = block.lines.len() < before;
                    let bare = block.rparen.comments.before.is_empty();
                    if shrunk && bare && block.lines.is_empty() {
                        continue;
                    }
                    if let [id] = block.lines[..] {
                        if shrunk && bare {
                            self.collapse(block, id);
                            self.stmts.push(Stmt::Line(id));
                            continue;
                        }
                    }
                    self.stmts.push(Stmt::Block(block));
                }
                stmt => self.stmts.push(stmt),
            }
        }
    }

    /// Merge a single-line block into its line
    fn collapse(&mut self, block: LineBlock, id: LineId) {
        let LineBlock {
            comments: block_comments,
            tokens: mut head,
            ..
        } = block;
        let line = self.line_mut(id);
        line.in_block = false;
        head.append(&mut line.tokens);
        line.tokens = head;

        let Comments {
            mut before,
            suffix,
            after,
        } = block_comments;
        before.append(&mut line.comments.before);
        line.comments.before = before;
        line.comments.suffix.extend(suffix);
        line.comments.after.extend(after);
    }
}

fn require_tokens(path: &str, version: &str) -> Vec<SmolStr> {
    vec![REQUIRE_VERB.into(), auto_quote(path).into(), version.into()]
}

/// Canonical form of `version`, checked against the major suffix of `path`
fn checked_version(path: &str, version: &str) -> Result<String, VersionError> {
    let canonical = canonical_version(version).ok_or_else(|| VersionError::malformed(version))?;
    let (_, path_major) = split_path_major(path)?;
    check_path_major(&canonical, path_major)?;
    Ok(canonical)
}

/// Canonical form of an optional version; empty stays empty
fn optional_version(version: &str) -> Result<String, VersionError> {
    if version.is_empty() {
        return Ok(String::new());
    }
    canonical_version(version).ok_or_else(|| VersionError::malformed(version))
}

impl ManifestFile {
    /// Declare or rename the module
    pub fn set_module(&mut self, path: &str) {
        let tokens = vec![MODULE_VERB.into(), auto_quote(path).into()];
        match &mut self.module {
            Some(module) => {
                module.path = path.to_string();
                let id = module.syntax;
                self.syntax.update_line(id, tokens);
            }
            None => {
                let id = self.syntax.add_line(None, tokens);
                self.module = Some(ModuleDirective {
                    path: path.to_string(),
                    deprecated: String::new(),
                    syntax: id,
                });
            }
        }
    }

    /// Require `path` at `version`
    ///
    /// The first requirement for `path` is updated in place and any others
    /// are removed. The version is canonicalized; nothing changes when it is
    /// malformed.
    pub fn add_require(
        &mut self,
        path: &str,
        version: &str,
        indirect: bool,
    ) -> Result<(), VersionError> {
        let version = checked_version(path, version)?;
        let mut found = None;
        let mut stale = Vec::new();
        for (k, r) in self.requires.iter_mut().enumerate() {
            if r.module.path != path {
                continue;
            }
            if found.is_none() {
                r.module.version = version.clone();
                self.syntax.update_line(r.syntax, require_tokens(path, &version));
                found = Some(k);
            } else {
                self.syntax.mark_removed(r.syntax);
                stale.push(r.syntax);
            }
        }
        self.requires.retain(|r| !stale.contains(&r.syntax));

        let k = match found {
            Some(_) => self.requires.iter().position(|r| r.module.path == path),
            None => {
                let id = self.syntax.add_line(None, require_tokens(path, &version));
                self.requires.push(RequireEntry {
                    module: ModuleVersion::new(path, version),
                    indirect: false,
                    syntax: id,
                });
                Some(self.requires.len() - 1)
            }
        };
        if let Some(k) = k {
            self.set_require_indirect(k, indirect);
        }
        Ok(())
    }

    /// Remove every requirement for `path`
    pub fn drop_require(&mut self, path: &str) {
        for r in self.requires.iter().filter(|r| r.module.path == path) {
            self.syntax.mark_removed(r.syntax);
        }
        self.requires.retain(|r| r.module.path != path);
    }

    /// Set or clear the `// indirect` marker of the requirement for `path`
    ///
    /// Returns whether such a requirement exists.
    pub fn set_indirect(&mut self, path: &str, indirect: bool) -> bool {
        let Some(k) = self.requires.iter().position(|r| r.module.path == path) else {
            return false;
        };
        self.set_require_indirect(k, indirect);
        true
    }

    fn set_require_indirect(&mut self, k: usize, indirect: bool) {
        let entry = &mut self.requires[k];
        entry.indirect = indirect;
        let line = self.syntax.line_mut(entry.syntax);
        if is_indirect(line) == indirect {
            return;
        }

        let suffix = &mut line.comments.suffix;
        let marker = format!("// {INDIRECT_MARKER}");
        if suffix.is_empty() {
            if indirect {
                suffix.push(Comment::new(Position::default(), marker, true));
            }
            return;
        }

        let com = &mut suffix[0];
        if indirect {
            com.text = if com.body().is_empty() {
                marker
            } else {
                format!("{marker}; {}", com.body())
            };
            return;
        }
        if com.body() == INDIRECT_MARKER {
            suffix.remove(0);
            return;
        }
        let partial = format!("{INDIRECT_MARKER};");
        if let Some(i) = com.text.find(&partial) {
            com.text = format!("//{}", &com.text[i + partial.len()..]);
        }
    }

    /// Exclude `path` at `version`; excluding it twice is a no-op
    pub fn add_exclude(&mut self, path: &str, version: &str) -> Result<(), VersionError> {
        let version = checked_version(path, version)?;
        let mut hint = None;
        for x in &self.excludes {
            if x.module.path == path && x.module.version == version {
                return Ok(());
            }
            if x.module.path == path {
                hint = Some(x.syntax);
            }
        }
        let tokens = vec![EXCLUDE_VERB.into(), auto_quote(path).into(), version.as_str().into()];
        let id = self.syntax.add_line(hint, tokens);
        self.excludes.push(ExcludeEntry {
            module: ModuleVersion::new(path, version),
            syntax: id,
        });
        Ok(())
    }

    /// Remove the exclusion of `path` at `version`
    pub fn drop_exclude(&mut self, path: &str, version: &str) {
        let target = ModuleVersion::new(path, version);
        for x in self.excludes.iter().filter(|x| x.module == target) {
            self.syntax.mark_removed(x.syntax);
        }
        self.excludes.retain(|x| x.module != target);
    }

    /// Replace `old_path` (at `old_version`, or every version when empty)
    /// with `new_path` at `new_version`
    ///
    /// The first matching replacement is rewritten in place and any further
    /// matches are removed, so at most one live rule covers the coordinate.
    /// A new line is grouped with existing replacements of the same path.
    pub fn add_replace(
        &mut self,
        old_path: &str,
        old_version: &str,
        new_path: &str,
        new_version: &str,
    ) -> Result<(), VersionError> {
        let old_version = optional_version(old_version)?;
        let new_version = optional_version(new_version)?;
        let old = ModuleVersion::new(old_path, old_version.as_str());
        let new = ModuleVersion::new(new_path, new_version.as_str());

        let mut tokens: Vec<SmolStr> = vec![REPLACE_VERB.into(), auto_quote(old_path).into()];
        if !old_version.is_empty() {
            tokens.push(old_version.as_str().into());
        }
        tokens.push(REPLACE_ARROW.into());
        tokens.push(auto_quote(new_path).into());
        if !new_version.is_empty() {
            tokens.push(new_version.as_str().into());
        }

        let mut need = true;
        let mut hint = None;
        let mut stale = Vec::new();
        for r in &mut self.replaces {
            if r.old.path != old_path {
                continue;
            }
            hint = Some(r.syntax);
            if !old_version.is_empty() && r.old.version != old_version {
                continue;
            }
            if need {
                r.old = old.clone();
                r.new = new.clone();
                self.syntax.update_line(r.syntax, tokens.clone());
                need = false;
            } else {
                tracing::trace!(replace = %r.old, "removing superseded replace");
                self.syntax.mark_removed(r.syntax);
                stale.push(r.syntax);
            }
        }
        self.replaces.retain(|r| !stale.contains(&r.syntax));

        if need {
            let id = self.syntax.add_line(hint, tokens);
            self.replaces.push(ReplaceEntry {
                old,
                new,
                syntax: id,
            });
        }
        Ok(())
    }

    /// Remove the replacement of `old_path` at exactly `old_version`
    pub fn drop_replace(&mut self, old_path: &str, old_version: &str) {
        let target = ModuleVersion::new(old_path, old_version);
        for r in self.replaces.iter().filter(|r| r.old == target) {
            tracing::trace!(replace = %r.old, "dropping replace");
            self.syntax.mark_removed(r.syntax);
        }
        self.replaces.retain(|r| r.old != target);
    }

    /// Mark or unmark the module as a draft
    ///
    /// The marker is a lone `// Draft` comment block opening the file, which
    /// the printer separates from the next statement by a blank line.
    pub fn set_draft(&mut self, draft: bool) {
        let marked = matches!(
            self.syntax.stmts.first(),
            Some(Stmt::Comments(block)) if parse_draft(block)
        );
        if draft && !marked {
            let mut block = CommentBlock {
                start: Position::start(),
                ..CommentBlock::default()
            };
            block.comments.before.push(Comment::new(
                Position::start(),
                format!("// {DRAFT_MARKER}"),
                false,
            ));
            self.syntax.stmts.insert(0, Stmt::Comments(block));
        } else if !draft && marked {
            self.syntax.stmts.remove(0);
        }
        self.draft = draft;
    }

    /// Append a free-standing comment at the end of the file
    ///
    /// Trailing comments carry no meaning; use [`ManifestFile::set_draft`]
    /// for the draft marker.
    pub fn add_comment_line(&mut self, text: &str) {
        let text = if text.starts_with("//") {
            text.to_string()
        } else {
            format!("// {text}")
        };
        let mut block = CommentBlock::default();
        block
            .comments
            .before
            .push(Comment::new(Position::default(), text, false));
        self.syntax.stmts.push(Stmt::Comments(block));
    }

    /// Drop removed lines from the syntax tree
    pub fn cleanup(&mut self) {
        self.syntax.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(source: &str) -> ManifestFile {
        ManifestFile::parse_str("gno.mod", source).unwrap()
    }

    #[test]
    fn test_add_line_without_hint_goes_to_last_block() {
        let mut file = manifest("module m\n\nrequire (\n\ta v1.0.0\n)\n\nrequire (\n\tb v1.0.0\n)\n");
        file.add_require("c", "v1.0.0", false).unwrap();
        assert_eq!(
            file.format(),
            "module m\n\nrequire (\n\ta v1.0.0\n)\n\nrequire (\n\tb v1.0.0\n\tc v1.0.0\n)\n"
        );
    }

    #[test]
    fn test_add_line_converts_line_to_block() {
        let mut file = manifest("module m\n\nrequire a v1.0.0\n");
        file.add_require("b", "v1.2", false).unwrap();
        assert_eq!(
            file.format(),
            "module m\n\nrequire (\n\ta v1.0.0\n\tb v1.2.0\n)\n"
        );
    }

    #[test]
    fn test_add_line_with_foreign_hint_goes_after() {
        let mut syntax = FileSyntax::new("gno.mod");
        let module = syntax.add_line(None, vec!["module".into(), "m".into()]);
        syntax.add_line(None, vec!["exclude".into(), "x".into(), "v1.0.0".into()]);
        syntax.add_line(Some(module), vec!["require".into(), "a".into(), "v1.0.0".into()]);
        assert_eq!(
            crate::parser::format(&syntax),
            "module m\n\nrequire a v1.0.0\n\nexclude x v1.0.0\n"
        );
    }

    #[test]
    fn test_add_require_updates_in_place() {
        let mut file = manifest("module m\n\n// keep me\nrequire a v1.0.0\n");
        file.add_require("a", "v1.1.0", false).unwrap();
        assert_eq!(file.requires.len(), 1);
        assert_eq!(file.format(), "module m\n\n// keep me\nrequire a v1.1.0\n");
    }

    #[test]
    fn test_malformed_version_changes_nothing() {
        let mut file = manifest("module m\n\nrequire a v1.0.0\n");
        let before = file.clone();
        assert!(file.add_require("a", "one", false).is_err());
        assert!(file.add_exclude("a", "v1.x").is_err());
        assert!(file.add_replace("a", "bad", "../a", "").is_err());
        assert_eq!(file, before);
    }

    #[test]
    fn test_drop_require_collapses_block() {
        let mut file = manifest("module m\n\nrequire (\n\ta v1.0.0\n\tb v1.0.0 // b\n)\n");
        file.drop_require("b");
        assert_eq!(file.format(), "module m\n\nrequire a v1.0.0\n");
        assert!(file.require("b").is_none());
        assert_eq!(file.syntax.line(file.requires[0].syntax).tokens[0], "require");
    }

    #[test]
    fn test_empty_and_comment_only_blocks_survive_cleanup() {
        let source = "module m\n\nrequire (\n)\n\nexclude (\n// none yet\n)\n";
        let mut file = manifest(source);
        assert_eq!(file.format(), source);
    }

    #[test]
    fn test_emptied_block_keeps_closing_comments() {
        let mut file = manifest("module m\n\nrequire (\n\ta v1.0.0\n\t// more to come\n)\n");
        file.drop_require("a");
        assert_eq!(file.format(), "module m\n\nrequire (\n// more to come\n)\n");
    }

    #[test]
    fn test_emptied_block_disappears() {
        let mut file = manifest("module m\n\nrequire (\n\ta v1.0.0\n\tb v1.0.0\n)\n");
        file.drop_require("a");
        file.drop_require("b");
        assert_eq!(file.format(), "module m\n");
    }

    #[test]
    fn test_single_line_block_survives_cleanup() {
        let source = "module m\n\nrequire (\n\ta v1.0.0\n)\n";
        let mut file = manifest(source);
        assert_eq!(file.format(), source);
    }

    #[test]
    fn test_set_indirect_edits_suffix_comment() {
        let mut file = manifest("module m\n\nrequire a v1.0.0 // note\n");
        assert!(file.set_indirect("a", true));
        assert_eq!(file.format(), "module m\n\nrequire a v1.0.0 // indirect; note\n");
        assert!(file.requires[0].indirect);

        assert!(file.set_indirect("a", false));
        assert_eq!(file.format(), "module m\n\nrequire a v1.0.0 // note\n");
        assert!(!file.set_indirect("missing", true));
    }

    #[test]
    fn test_add_exclude_is_idempotent() {
        let mut file = manifest("module m\n");
        file.add_exclude("a", "v1.0.0").unwrap();
        file.add_exclude("a", "v1.0.0").unwrap();
        file.add_exclude("a", "v1.1.0").unwrap();
        assert_eq!(file.excludes.len(), 2);
        assert_eq!(
            file.format(),
            "module m\n\nexclude (\n\ta v1.0.0\n\ta v1.1.0\n)\n"
        );
        file.drop_exclude("a", "v1.0.0");
        assert_eq!(file.format(), "module m\n\nexclude a v1.1.0\n");
    }

    #[test]
    fn test_set_module_renames() {
        let mut file = manifest("// header\nmodule old\n");
        file.set_module("gno.land/r/demo/new");
        assert_eq!(file.module_path(), "gno.land/r/demo/new");
        assert_eq!(file.format(), "// header\nmodule gno.land/r/demo/new\n");
    }

    #[test]
    fn test_set_draft_round_trips() {
        let mut file = ManifestFile::new("gno.land/p/demo/x");
        file.set_draft(true);
        file.set_draft(true);
        let text = file.format();
        assert_eq!(text, "// Draft\n\nmodule gno.land/p/demo/x\n");
        assert!(manifest(&text).draft);

        let mut file = manifest(&text);
        file.set_draft(false);
        assert!(!file.draft);
        assert_eq!(file.format(), "module gno.land/p/demo/x\n");
    }

    #[test]
    fn test_add_comment_line() {
        let mut file = ManifestFile::new("gno.land/p/demo/x");
        file.add_comment_line("Draft");
        assert_eq!(file.format(), "module gno.land/p/demo/x\n\n// Draft\n");
    }
}
