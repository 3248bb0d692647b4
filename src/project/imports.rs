//! Import extraction from source files
//!
//! Only the head of a source file is read: the package clause followed by
//! its import declarations. Parsing stops at the first token that does not
//! continue an import declaration, so the rest of the file is never lexed.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use logos::{Logos, SpannedIter};
use rayon::prelude::*;

use crate::base::constants::{FILETEST_SUFFIX, TEST_FILE_SUFFIX};
use crate::base::{Position, unquote};

use super::errors::ImportError;
use super::file_loader::read_source_files;

/// Which files of a package contribute imports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Read `_test` files
    pub include_tests: bool,
    /// Read `_filetest` files
    pub include_filetests: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            include_tests: true,
            include_filetests: false,
        }
    }
}

impl ImportOptions {
    fn accepts(&self, name: &str) -> bool {
        if name.ends_with(FILETEST_SUFFIX) {
            return self.include_filetests;
        }
        if name.ends_with(TEST_FILE_SUFFIX) {
            return self.include_tests;
        }
        true
    }
}

fn is_alias(lex: &mut logos::Lexer<'_, SourceToken>) -> bool {
    let mut chars = lex.slice().chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || unicode_ident::is_xid_start(c))
        && chars.all(unicode_ident::is_xid_continue)
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip(r"//[^\n]*", allow_greedy = true))]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
enum SourceToken {
    #[token("package")]
    Package,
    #[token("import")]
    Import,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r"`[^`]*`")]
    String,
    #[regex(r"[\p{L}\p{N}_]+", is_alias)]
    Ident,
}

/// Reads the import declarations at the head of one file
struct HeaderParser<'a> {
    path: &'a Path,
    source: &'a str,
    tokens: std::iter::Peekable<SpannedIter<'a, SourceToken>>,
    /// Offset of the last token returned
    offset: usize,
}

type Spanned = (Result<SourceToken, ()>, std::ops::Range<usize>);

impl<'a> HeaderParser<'a> {
    fn new(path: &'a Path, source: &'a str) -> Self {
        Self {
            path,
            source,
            tokens: SourceToken::lexer(source).spanned().peekable(),
            offset: 0,
        }
    }

    fn next(&mut self) -> Option<Spanned> {
        let tok = self.tokens.next()?;
        self.offset = tok.1.start;
        Some(tok)
    }

    fn peek_is(&mut self, kind: SourceToken) -> bool {
        matches!(self.tokens.peek(), Some((Ok(k), _)) if *k == kind)
    }

    fn error(&self, message: impl Into<String>) -> ImportError {
        let mut pos = Position::start();
        pos.advance(&self.source[..self.offset]);
        ImportError::Syntax {
            path: self.path.to_path_buf(),
            line: pos.line,
            column: pos.column,
            message: message.into(),
        }
    }

    fn expect(&mut self, kind: SourceToken, what: &str) -> Result<std::ops::Range<usize>, ImportError> {
        match self.next() {
            Some((Ok(k), span)) if k == kind => Ok(span),
            Some(_) => Err(self.error(format!("expected {what}"))),
            None => {
                self.offset = self.source.len();
                Err(self.error(format!("expected {what}, found EOF")))
            }
        }
    }

    fn skip_semicolons(&mut self) {
        while self.peek_is(SourceToken::Semicolon) {
            self.next();
        }
    }

    fn imports(mut self) -> Result<Vec<String>, ImportError> {
        self.expect(SourceToken::Package, "'package'")?;
        self.expect(SourceToken::Ident, "package name")?;
        self.skip_semicolons();

        let mut imports = Vec::new();
        while self.peek_is(SourceToken::Import) {
            self.next();
            if self.peek_is(SourceToken::LParen) {
                self.next();
                self.skip_semicolons();
                while !self.peek_is(SourceToken::RParen) {
                    imports.push(self.import_decl()?);
                    self.skip_semicolons();
                }
                self.next();
            } else {
                imports.push(self.import_decl()?);
            }
            self.skip_semicolons();
        }
        Ok(imports)
    }

    /// `[alias | .] "path"`
    fn import_decl(&mut self) -> Result<String, ImportError> {
        if self.peek_is(SourceToken::Ident) || self.peek_is(SourceToken::Dot) {
            self.next();
        }
        let span = self.expect(SourceToken::String, "import path")?;
        unquote(&self.source[span]).map_err(|err| self.error(format!("invalid import path: {err}")))
    }
}

/// Import paths declared by one source file, in source order
pub fn file_imports(path: &Path) -> Result<Vec<String>, ImportError> {
    let source = std::fs::read_to_string(path).map_err(|err| ImportError::io(path, err))?;
    source_imports(path, &source)
}

/// Import paths declared by `source`; `path` is only used in errors
pub fn source_imports(path: &Path, source: &str) -> Result<Vec<String>, ImportError> {
    HeaderParser::new(path, source).imports()
}

fn package_files(dir: &Path, options: &ImportOptions) -> Result<Vec<PathBuf>, ImportError> {
    let mut files = read_source_files(dir)?;
    files.retain(|f| {
        f.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| options.accepts(n))
    });
    Ok(files)
}

/// Sorted, de-duplicated imports of the package in `dir`
///
/// Subdirectories are separate packages and are not read.
pub fn package_imports(dir: &Path, options: &ImportOptions) -> Result<Vec<String>, ImportError> {
    let set = import_to_files(dir, options)?;
    let mut imports: Vec<String> = set.paths().map(str::to_string).collect();
    imports.sort();
    tracing::trace!(dir = %dir.display(), count = imports.len(), "package imports");
    Ok(imports)
}

/// Imports of each package in `dirs`, read in parallel
///
/// Results are in the order of `dirs`.
pub fn imports_for_packages(
    dirs: &[PathBuf],
    options: &ImportOptions,
) -> Vec<Result<Vec<String>, ImportError>> {
    dirs.par_iter()
        .map(|dir| package_imports(dir, options))
        .collect()
}

/// Import path to the names of the files importing it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct ImportSet {
    files: IndexMap<String, Vec<String>>,
}

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `file` imports `path`; repeated pairs are kept once
    pub fn insert(&mut self, path: impl Into<String>, file: impl Into<String>) {
        let file = file.into();
        let files = self.files.entry(path.into()).or_default();
        if !files.contains(&file) {
            files.push(file);
        }
    }

    /// Files importing `path`, in first-seen order
    pub fn get(&self, path: &str) -> Option<&[String]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Import paths in first-seen order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Import paths in lexical order
    pub fn sorted_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.paths().collect();
        paths.sort_unstable();
        paths
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Which files of the package in `dir` import each path
///
/// Files whose header does not parse are logged and skipped.
pub fn import_to_files(dir: &Path, options: &ImportOptions) -> Result<ImportSet, ImportError> {
    let mut set = ImportSet::new();
    for file in package_files(dir, options)? {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let imports = match file_imports(&file) {
            Ok(imports) => imports,
            Err(err @ ImportError::Syntax { .. }) => {
                tracing::warn!(error = %err, "skipping unparsable source file");
                continue;
            }
            Err(err) => return Err(err),
        };
        for import in imports {
            set.insert(import, name.as_str());
        }
    }
    Ok(set)
}

/// One `mod why` stanza
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhyStanza {
    pub import: String,
    /// Files importing the path; `None` when the module does not need it
    pub files: Option<Vec<String>>,
}

/// Explains which files need each requested import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhyReport {
    pub module_path: String,
    pub stanzas: Vec<WhyStanza>,
}

impl WhyReport {
    pub fn new<S: AsRef<str>>(module_path: &str, imports: &[S], set: &ImportSet) -> Self {
        let stanzas = imports
            .iter()
            .map(|import| {
                let import = import.as_ref();
                WhyStanza {
                    import: import.to_string(),
                    files: set.get(import).map(<[String]>::to_vec),
                }
            })
            .collect();
        Self {
            module_path: module_path.to_string(),
            stanzas,
        }
    }
}

impl fmt::Display for WhyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stanza) in self.stanzas.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "# {}", stanza.import)?;
            match &stanza.files {
                Some(files) => {
                    for file in files {
                        writeln!(f, "{file}")?;
                    }
                }
                None => writeln!(
                    f,
                    "(module {} does not need package {})",
                    self.module_path, stanza.import
                )?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imports(source: &str) -> Result<Vec<String>, ImportError> {
        source_imports(Path::new("a.gno"), source)
    }

    #[test]
    fn test_grouped_and_single_imports() {
        let source = r#"
// Package doc
package tmp

import "std"
import (
	"gno.land/p/demo/avl" // trees
	ufmt "gno.land/p/demo/ufmt"
	. "gno.land/p/demo/dot"; _ "gno.land/p/demo/blank"
	/* raw */ `gno.land/p/demo/raw`
)

func main() { println("import \"not\"") }
"#;
        assert_eq!(
            imports(source).unwrap(),
            vec![
                "std",
                "gno.land/p/demo/avl",
                "gno.land/p/demo/ufmt",
                "gno.land/p/demo/dot",
                "gno.land/p/demo/blank",
                "gno.land/p/demo/raw",
            ]
        );
    }

    #[test]
    fn test_no_imports() {
        assert!(imports("package x\n\nfunc F() {}\n").unwrap().is_empty());
    }

    #[test]
    fn test_missing_package_clause() {
        let err = imports("\n\nimport \"std\"\n").unwrap_err();
        assert_eq!(err.to_string(), "a.gno:3:1: expected 'package'");
    }

    #[test]
    fn test_unterminated_group() {
        assert!(imports("package x\nimport (\n\t\"std\"\n").is_err());
    }

    #[test]
    fn test_import_set_dedupes_pairs() {
        let mut set = ImportSet::new();
        set.insert("b", "x.gno");
        set.insert("a", "y.gno");
        set.insert("b", "x.gno");
        set.insert("b", "z.gno");
        assert_eq!(set.get("b").unwrap(), ["x.gno", "z.gno"]);
        assert_eq!(set.sorted_paths(), vec!["a", "b"]);
        assert_eq!(set.paths().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn test_why_report_format() {
        let mut set = ImportSet::new();
        set.insert("gno.land/p/demo/avl", "a.gno");
        set.insert("gno.land/p/demo/avl", "b.gno");
        let report = WhyReport::new(
            "gno.land/r/demo/x",
            &["gno.land/p/demo/avl", "gno.land/p/demo/users"],
            &set,
        );
        assert_eq!(
            report.to_string(),
            "# gno.land/p/demo/avl\na.gno\nb.gno\n\n# gno.land/p/demo/users\n(module gno.land/r/demo/x does not need package gno.land/p/demo/users)\n"
        );
    }
}
