//! Decoding of directive lines into manifest entries.
//!
//! Decoding normalizes arguments in place: quoted paths that do not need
//! quoting lose their quotes and versions are rewritten in canonical form.

use std::sync::LazyLock;

use regex::Regex;
use smol_str::SmolStr;
use thiserror::Error;

use crate::base::constants::{
    DRAFT_MARKER, EXCLUDE_VERB, INDIRECT_MARKER, MODULE_VERB, REPLACE_ARROW, REPLACE_VERB,
    REQUIRE_VERB,
};
use crate::base::{
    ModuleVersion, Position, UnquoteError, VersionError, auto_quote, canonical_version,
    check_path_major, is_directory_path, split_path_major, unquote,
};
use crate::parser::{CommentBlock, Comments, ErrorList, Line, LineId, Stmt};

use super::errors::{DirectiveError, DirectiveErrorKind};
use super::manifest::{ExcludeEntry, ManifestFile, ModuleDirective, ReplaceEntry, RequireEntry};

static DEPRECATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(?:^|\n\n)Deprecated: *(.*?)(?:$|\n\n)").expect("valid deprecation pattern")
});

#[derive(Debug, Error)]
enum ArgError {
    #[error(transparent)]
    Unquote(#[from] UnquoteError),
    #[error("unquoted string cannot contain quote")]
    StrayQuote,
}

/// Interpret a possibly quoted argument, rewriting it in its preferred form
fn parse_string(arg: &mut SmolStr) -> Result<String, ArgError> {
    let text = if arg.starts_with('"') {
        unquote(arg)?
    } else if arg.contains(['"', '\'', '`']) {
        return Err(ArgError::StrayQuote);
    } else {
        arg.to_string()
    };
    *arg = auto_quote(&text).into();
    Ok(text)
}

/// Interpret a version argument, rewriting it in canonical form
fn parse_version(arg: &mut SmolStr) -> Result<String, VersionError> {
    let text = parse_string(arg).map_err(|err| VersionError::Invalid {
        version: arg.to_string(),
        reason: err.to_string(),
    })?;
    let canonical = canonical_version(&text).ok_or_else(|| VersionError::malformed(&text))?;
    *arg = SmolStr::new(&canonical);
    Ok(canonical)
}

/// Whether the first suffix comment of `line` is an `indirect` marker
pub(crate) fn is_indirect(line: &Line) -> bool {
    let Some(com) = line.comments.suffix.first() else {
        return false;
    };
    let fields: Vec<&str> = com
        .text
        .strip_prefix("//")
        .unwrap_or(&com.text)
        .split_whitespace()
        .collect();
    match fields.as_slice() {
        [only] => *only == INDIRECT_MARKER,
        [first, _, ..] => first.strip_suffix(';') == Some(INDIRECT_MARKER),
        [] => false,
    }
}

/// Text of the comments on a directive, one comment per line
///
/// A line without comments of its own inside a commented block uses the
/// block's comments instead.
fn directive_comment(line: &Comments, block: Option<&Comments>) -> String {
    let comments = match block {
        Some(block) if line.before.is_empty() && line.suffix.is_empty() => block,
        _ => line,
    };
    comments
        .before
        .iter()
        .chain(&comments.suffix)
        .filter(|c| c.text.starts_with("//"))
        .map(|c| c.body())
        .collect::<Vec<_>>()
        .join("\n")
}

/// The first deprecation paragraph in a module directive's comments
fn parse_deprecation(line: &Comments, block: Option<&Comments>) -> String {
    let text = directive_comment(line, block);
    DEPRECATION
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .map_or_else(String::new, |m| m.as_str().to_string())
}

/// Whether a comment block marks the module as a draft
pub(crate) fn parse_draft(block: &CommentBlock) -> bool {
    matches!(block.comments.before.as_slice(), [com] if com.body() == DRAFT_MARKER)
}

fn is_directive(verb: &str) -> bool {
    matches!(verb, MODULE_VERB | REQUIRE_VERB | EXCLUDE_VERB | REPLACE_VERB)
}

/// A decoding failure, before it is located in the file
struct Failed {
    kind: DirectiveErrorKind,
    /// Module path the failure concerns, reported after the verb
    module_path: Option<String>,
}

impl Failed {
    fn module(path: &str, kind: impl Into<DirectiveErrorKind>) -> Self {
        Self {
            kind: kind.into(),
            module_path: Some(path.to_string()),
        }
    }
}

impl From<DirectiveErrorKind> for Failed {
    fn from(kind: DirectiveErrorKind) -> Self {
        Self {
            kind,
            module_path: None,
        }
    }
}

fn invalid_quote(err: ArgError) -> Failed {
    DirectiveErrorKind::InvalidQuote(err.to_string()).into()
}

/// Decodes directive lines into a manifest, collecting errors
pub(crate) struct Decoder<'m> {
    file: &'m mut ManifestFile,
    errors: ErrorList<DirectiveError>,
}

impl<'m> Decoder<'m> {
    pub(crate) fn new(file: &'m mut ManifestFile) -> Self {
        Self {
            file,
            errors: ErrorList::new(),
        }
    }

    /// Decode every statement of the file
    pub(crate) fn run(mut self) -> ErrorList<DirectiveError> {
        for i in 0..self.file.syntax.stmts.len() {
            match &self.file.syntax.stmts[i] {
                Stmt::Comments(block) => {
                    if block.start.line == 1 {
                        let draft = parse_draft(block);
                        self.file.draft = draft;
                    }
                }
                Stmt::Line(id) => {
                    let id = *id;
                    let Some(verb) = self.file.syntax.line(id).tokens.first().cloned() else {
                        continue;
                    };
                    self.line(None, id, &verb);
                }
                Stmt::Block(block) => {
                    if block.tokens.len() != 1 || !is_directive(block.verb()) {
                        let (start, tokens) = (block.start, block.tokens.join(" "));
                        self.error(start, DirectiveErrorKind::UnknownBlock(tokens));
                        continue;
                    }
                    let verb = block.tokens[0].clone();
                    let lines = block.lines.clone();
                    for id in lines {
                        self.line(Some(i), id, &verb);
                    }
                }
            }
        }
        self.errors
    }

    fn error(&mut self, pos: Position, kind: DirectiveErrorKind) {
        let filename = self.file.syntax.name.clone();
        self.errors.push(DirectiveError::new(filename, pos, kind));
    }

    /// Decode line `id` as a `verb` directive
    ///
    /// `block` is the statement index of the enclosing block, if any. On
    /// success the line's arguments are replaced by their normalized form.
    fn line(&mut self, block: Option<usize>, id: LineId, verb: &str) {
        let line = self.file.syntax.line(id);
        let start = line.start;
        let skip = usize::from(!line.in_block);
        let mut args: Vec<SmolStr> = line.tokens.get(skip..).unwrap_or_default().to_vec();

        match self.decode(block, id, verb, &mut args) {
            Ok(()) => {
                let line = self.file.syntax.line_mut(id);
                line.tokens.truncate(skip);
                line.tokens.extend(args);
            }
            Err(failed) => {
                let filename = self.file.syntax.name.clone();
                let mut err = DirectiveError::new(filename, start, failed.kind);
                if let Some(path) = failed.module_path {
                    err = err.with_module(verb, path);
                }
                self.errors.push(err);
            }
        }
    }

    fn decode(
        &mut self,
        block: Option<usize>,
        id: LineId,
        verb: &str,
        args: &mut [SmolStr],
    ) -> Result<(), Failed> {
        match verb {
            MODULE_VERB => self.module(block, id, args),
            REQUIRE_VERB | EXCLUDE_VERB => {
                let [path_arg, version_arg] = args else {
                    return Err(DirectiveErrorKind::Usage(format!("{verb} module/path v1.2.3")).into());
                };
                let path = parse_string(path_arg).map_err(invalid_quote)?;
                let version = parse_version(version_arg).map_err(|e| Failed::module(&path, e))?;
                let (_, path_major) = split_path_major(&path).map_err(|e| Failed::module(&path, e))?;
                check_path_major(&version, path_major).map_err(|e| Failed::module(&path, e))?;

                let module = ModuleVersion::new(path, version);
                if verb == REQUIRE_VERB {
                    let indirect = is_indirect(self.file.syntax.line(id));
                    self.file.requires.push(RequireEntry {
                        module,
                        indirect,
                        syntax: id,
                    });
                } else {
                    self.file.excludes.push(ExcludeEntry { module, syntax: id });
                }
                Ok(())
            }
            REPLACE_VERB => {
                let (old, new) = parse_replace(verb, args)?;
                self.file.replaces.push(ReplaceEntry { old, new, syntax: id });
                Ok(())
            }
            _ => Err(DirectiveErrorKind::UnknownDirective(verb.to_string()).into()),
        }
    }

    fn module(&mut self, block: Option<usize>, id: LineId, args: &mut [SmolStr]) -> Result<(), Failed> {
        if self.file.module.is_some() {
            return Err(DirectiveErrorKind::RepeatedModule.into());
        }
        let block_comments = block.and_then(|i| match &self.file.syntax.stmts[i] {
            Stmt::Block(block) => Some(&block.comments),
            _ => None,
        });
        let deprecated = parse_deprecation(&self.file.syntax.line(id).comments, block_comments);
        let module = self.file.module.insert(ModuleDirective {
            path: String::new(),
            deprecated,
            syntax: id,
        });

        let [arg] = args else {
            return Err(DirectiveErrorKind::Usage("module module/path".to_string()).into());
        };
        module.path = parse_string(arg).map_err(invalid_quote)?;
        Ok(())
    }
}

/// Decode `old [oldV] => new [newV]`
fn parse_replace(verb: &str, args: &mut [SmolStr]) -> Result<(ModuleVersion, ModuleVersion), Failed> {
    let arrow = if args.len() >= 2 && args[1] == REPLACE_ARROW { 1 } else { 2 };
    if args.len() < arrow + 2 || args.len() > arrow + 3 || args[arrow] != REPLACE_ARROW {
        return Err(DirectiveErrorKind::Usage(format!(
            "{verb} module/path [v1.2.3] => other/module v1.4\n\t or {verb} module/path [v1.2.3] => ../local/directory"
        ))
        .into());
    }

    let old_path = parse_string(&mut args[0]).map_err(invalid_quote)?;
    let (_, path_major) = split_path_major(&old_path).map_err(|e| Failed::module(&old_path, e))?;
    let mut old_version = String::new();
    if arrow == 2 {
        old_version = parse_version(&mut args[1]).map_err(|e| Failed::module(&old_path, e))?;
        check_path_major(&old_version, path_major).map_err(|e| Failed::module(&old_path, e))?;
    }

    let new_path = parse_string(&mut args[arrow + 1]).map_err(invalid_quote)?;
    let mut new_version = String::new();
    if args.len() == arrow + 2 {
        if !is_directory_path(&new_path) {
            let msg = if new_path.contains('@') {
                "replacement module must match format 'path version', not 'path@version'"
            } else {
                "replacement module without version must be directory path (rooted or starting with . or ..)"
            };
            return Err(DirectiveErrorKind::Replacement(msg.to_string()).into());
        }
        if std::path::MAIN_SEPARATOR == '/' && new_path.contains('\\') {
            return Err(DirectiveErrorKind::Replacement(
                "replacement directory appears to be Windows path (on a non-windows system)".to_string(),
            )
            .into());
        }
    } else {
        new_version = parse_version(&mut args[arrow + 2]).map_err(|e| Failed::module(&new_path, e))?;
        if is_directory_path(&new_path) {
            return Err(DirectiveErrorKind::Replacement(format!(
                "replacement module directory path {new_path:?} cannot have version"
            ))
            .into());
        }
    }

    Ok((
        ModuleVersion::new(old_path, old_version),
        ModuleVersion::new(new_path, new_version),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Comment;

    fn args(text: &str) -> Vec<SmolStr> {
        text.split_whitespace().map(SmolStr::new).collect()
    }

    fn suffixed(text: &str) -> Line {
        let mut line = Line::new(args("require a v1.0.0"), false);
        line.comments.suffix.push(Comment::new(Position::start(), text, true));
        line
    }

    #[test]
    fn test_parse_string_normalizes_quotes() {
        let mut arg = SmolStr::new("\"gno.land/p/demo/avl\"");
        assert_eq!(parse_string(&mut arg).unwrap(), "gno.land/p/demo/avl");
        assert_eq!(arg, "gno.land/p/demo/avl");

        let mut arg = SmolStr::new("\"with space\"");
        assert_eq!(parse_string(&mut arg).unwrap(), "with space");
        assert_eq!(arg, "\"with space\"");

        let mut arg = SmolStr::new("it's");
        assert!(matches!(parse_string(&mut arg), Err(ArgError::StrayQuote)));
    }

    #[test]
    fn test_parse_version_canonicalizes() {
        let mut arg = SmolStr::new("v1.2");
        assert_eq!(parse_version(&mut arg).unwrap(), "v1.2.0");
        assert_eq!(arg, "v1.2.0");

        let mut arg = SmolStr::new("latest");
        let err = parse_version(&mut arg).unwrap_err();
        assert_eq!(err.to_string(), "version \"latest\" invalid: must be of the form v1.2.3");
        assert_eq!(arg, "latest");
    }

    #[test]
    fn test_is_indirect() {
        assert!(is_indirect(&suffixed("// indirect")));
        assert!(is_indirect(&suffixed("//indirect; pulled by x")));
        assert!(!is_indirect(&suffixed("// indirectly")));
        assert!(!is_indirect(&suffixed("// indirect pulled")));
        assert!(!is_indirect(&Line::new(args("require a v1.0.0"), false)));
    }

    #[test]
    fn test_parse_deprecation_first_paragraph() {
        let mut comments = Comments::default();
        for text in ["// Some notes", "//", "// Deprecated: use v2", "// instead", "//", "// Deprecated: other"] {
            comments.before.push(Comment::new(Position::start(), text, false));
        }
        assert_eq!(parse_deprecation(&comments, None), "use v2\ninstead");
    }

    #[test]
    fn test_parse_deprecation_falls_back_to_block() {
        let mut block = Comments::default();
        block
            .before
            .push(Comment::new(Position::start(), "// Deprecated: gone", false));
        assert_eq!(parse_deprecation(&Comments::default(), Some(&block)), "gone");
        assert_eq!(parse_deprecation(&Comments::default(), None), "");
    }

    #[test]
    fn test_parse_replace_forms() {
        let (old, new) = parse_replace("replace", &mut args("a v1.0.0 => b v1.1")).unwrap_or_else(|f| panic!("{}", f.kind));
        assert_eq!(old, ModuleVersion::new("a", "v1.0.0"));
        assert_eq!(new, ModuleVersion::new("b", "v1.1.0"));

        let (old, new) = parse_replace("replace", &mut args("a => ../a")).unwrap_or_else(|f| panic!("{}", f.kind));
        assert_eq!(old, ModuleVersion::unversioned("a"));
        assert_eq!(new, ModuleVersion::unversioned("../a"));
    }

    #[test]
    fn test_parse_replace_errors() {
        let cases = [
            ("a b", "usage: replace module/path"),
            ("a => b", "replacement module without version must be directory path"),
            ("a => b@v1.0.0", "not 'path@version'"),
            ("a => ./b v1.0.0", "cannot have version"),
            ("a v2.0.0 => ./b", "should be v0 or v1, not v2"),
        ];
        for (input, expected) in cases {
            let Err(failed) = parse_replace("replace", &mut args(input)) else {
                panic!("{input} should fail");
            };
            assert!(failed.kind.to_string().contains(expected), "{input}: {}", failed.kind);
        }
    }
}
