//! Logos-based lexer for manifest files
//!
//! Produces identifiers, quoted strings, punctuation, newlines and comments.
//! Spaces, tabs and carriage returns separate tokens and are dropped.
//! A `//` comment swallows its terminating newline; it is a suffix comment
//! when other text precedes it on the same line.

use logos::Logos;

use crate::base::Position;

use super::errors::{ErrorCode, ErrorList, SyntaxError};

/// Kinds of tokens handed to the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,
    Newline,
    /// A comment alone on its line
    Comment,
    /// A comment following other tokens on its line
    SuffixComment,
    Ident,
    String,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
}

impl TokenKind {
    pub fn is_comment(self) -> bool {
        matches!(self, Self::Comment | Self::SuffixComment)
    }

    /// Whether a token of this kind terminates a line
    pub fn is_eol(self) -> bool {
        matches!(self, Self::Eof | Self::SuffixComment | Self::Newline)
    }
}

/// A token with its kind, text, and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Source text; comments exclude their trailing newline
    pub text: &'a str,
    pub start: Position,
    pub end: Position,
}

/// Failure modes reported by the logos callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexErrorKind {
    #[default]
    UnexpectedChar,
    EofInString,
    NewlineInString,
    BlockComment,
}

impl LexErrorKind {
    fn code(self) -> ErrorCode {
        match self {
            Self::UnexpectedChar => ErrorCode::E0101,
            Self::EofInString => ErrorCode::E0102,
            Self::NewlineInString => ErrorCode::E0103,
            Self::BlockComment => ErrorCode::E0104,
        }
    }
}

/// Logos token enum - maps to TokenKind
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t\r]+")]
enum RawToken {
    #[token("\n")]
    Newline,

    #[regex(r"//[^\n]*\n?", allow_greedy = true)]
    Comment,

    #[token("/*")]
    BlockComment,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,

    #[token("\"", lex_string)]
    #[token("`", lex_string)]
    String,

    #[regex(r#"[^ \t\r\n()\[\]{},"`/]"#, lex_ident)]
    #[token("/", lex_ident)]
    Ident,
}

/// Scan the rest of a quoted string whose opening quote was just matched
fn lex_string(lex: &mut logos::Lexer<RawToken>) -> Result<(), LexErrorKind> {
    let quote = lex.slice().chars().next().unwrap_or('"');
    let mut len = 0;
    let mut chars = lex.remainder().chars();
    loop {
        let Some(c) = chars.next() else {
            lex.bump(len);
            return Err(LexErrorKind::EofInString);
        };
        if c == '\n' {
            lex.bump(len);
            return Err(LexErrorKind::NewlineInString);
        }
        len += c.len_utf8();
        if c == quote {
            lex.bump(len);
            return Ok(());
        }
        if c == '\\' && quote != '`' {
            let Some(escaped) = chars.next() else {
                lex.bump(len);
                return Err(LexErrorKind::EofInString);
            };
            len += escaped.len_utf8();
        }
    }
}

/// Whether `c` may appear in a bare identifier
fn is_ident_char(c: char) -> bool {
    match c {
        ' ' | '(' | ')' | '[' | ']' | '{' | '}' | ',' => false,
        c => !c.is_whitespace() && !c.is_control(),
    }
}

/// Extend an identifier until a separator or comment start
fn lex_ident(lex: &mut logos::Lexer<RawToken>) -> Result<(), LexErrorKind> {
    let first = lex.slice().chars().next().unwrap_or(' ');
    if !is_ident_char(first) {
        return Err(LexErrorKind::UnexpectedChar);
    }
    let rest = lex.remainder();
    let mut len = 0;
    for (i, c) in rest.char_indices() {
        if !is_ident_char(c) {
            break;
        }
        if c == '/' {
            let tail = &rest[i..];
            if tail.starts_with("//") {
                break;
            }
            if tail.starts_with("/*") {
                // consume the opener so it is reported once
                lex.bump(len + 2);
                return Err(LexErrorKind::BlockComment);
            }
        }
        len = i + c.len_utf8();
    }
    lex.bump(len);
    Ok(())
}

/// Lexer wrapping the logos-generated tokenizer
///
/// Yields tokens in order and records every lexical error instead of stopping
/// at the first one.
pub struct Lexer<'a> {
    filename: &'a str,
    source: &'a str,
    inner: logos::Lexer<'a, RawToken>,
    pos: Position,
    errors: ErrorList<SyntaxError>,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(filename: &'a str, source: &'a str) -> Self {
        Self {
            filename,
            source,
            inner: RawToken::lexer(source),
            pos: Position::start(),
            errors: ErrorList::new(),
            done: false,
        }
    }

    /// Position of byte `offset`, which must not precede earlier requests
    fn position_at(&mut self, offset: usize) -> Position {
        let from = usize::from(self.pos.offset);
        if offset > from {
            self.pos.advance(&self.source[from..offset]);
        }
        self.pos
    }

    fn error(&mut self, offset: usize, kind: LexErrorKind) {
        let pos = self.position_at(offset);
        tracing::trace!(file = self.filename, line = pos.line, ?kind, "lex error");
        let code = kind.code();
        let err = match kind {
            LexErrorKind::UnexpectedChar => {
                let c = self.source[offset..].chars().next().unwrap_or_default();
                let message = format!("{} {:?}", code.default_message(), c);
                SyntaxError::new(self.filename, pos, code, message)
            }
            _ => SyntaxError::from_code(self.filename, pos, code),
        };
        self.errors.push(err);
    }

    /// Whether only whitespace precedes `offset` on its line
    fn starts_line(&self, offset: usize) -> bool {
        let line_start = self.source[..offset].rfind('\n').map_or(0, |i| i + 1);
        self.source[line_start..offset].trim().is_empty()
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let Some(raw) = self.inner.next() else {
                self.done = true;
                let end = self.position_at(self.source.len());
                return Some(Token {
                    kind: TokenKind::Eof,
                    text: "",
                    start: end,
                    end,
                });
            };
            let span = self.inner.span();
            let raw = match raw {
                Ok(RawToken::BlockComment) => Err(LexErrorKind::BlockComment),
                other => other,
            };
            let raw = match raw {
                Ok(raw) => raw,
                Err(kind) => {
                    let at = match kind {
                        LexErrorKind::NewlineInString => span.end,
                        // the span always ends just past the `/*`
                        LexErrorKind::BlockComment => span.end - 2,
                        _ => span.start,
                    };
                    self.error(at, kind);
                    continue;
                }
            };

            let start = self.position_at(span.start);
            let end = self.position_at(span.end);
            let mut text = &self.source[span.clone()];
            let kind = match raw {
                RawToken::Newline => TokenKind::Newline,
                RawToken::Comment => {
                    text = text
                        .strip_suffix("\r\n")
                        .or_else(|| text.strip_suffix('\n'))
                        .unwrap_or(text);
                    if self.starts_line(span.start) {
                        TokenKind::Comment
                    } else {
                        TokenKind::SuffixComment
                    }
                }
                RawToken::LParen => TokenKind::LParen,
                RawToken::RParen => TokenKind::RParen,
                RawToken::LBracket => TokenKind::LBracket,
                RawToken::RBracket => TokenKind::RBracket,
                RawToken::LBrace => TokenKind::LBrace,
                RawToken::RBrace => TokenKind::RBrace,
                RawToken::Comma => TokenKind::Comma,
                RawToken::String => TokenKind::String,
                RawToken::Ident => TokenKind::Ident,
                RawToken::BlockComment => continue,
            };
            return Some(Token {
                kind,
                text,
                start,
                end,
            });
        }
    }
}

/// Tokenize an entire input, ending with an `Eof` token
///
/// Fails with every lexical error in the input when there is at least one.
pub fn tokenize<'a>(
    filename: &'a str,
    source: &'a str,
) -> Result<Vec<Token<'a>>, ErrorList<SyntaxError>> {
    let mut lexer = Lexer::new(filename, source);
    let tokens: Vec<Token<'a>> = lexer.by_ref().collect();
    let errors = std::mem::take(&mut lexer.errors);
    errors.into_result(tokens)
}
