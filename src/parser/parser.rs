//! Recursive descent parser for manifest files
//!
//! Builds a [`FileSyntax`] from the token stream. The grammar is line
//! oriented: a statement is a comment block, a line of tokens, or a keyword
//! followed by `(` at end of line opening a block of lines.

use smol_str::SmolStr;

use crate::base::Position;

use super::ast::{
    Comment, CommentBlock, Comments, FileSyntax, LParen, Line, LineBlock, LineId, RParen, Stmt,
};
use super::comments::assign_comments;
use super::errors::{ErrorCode, ErrorList, SyntaxError};
use super::lexer::{Token, TokenKind, tokenize};

/// Parse a manifest into a syntax tree with comments attached
///
/// Lexical errors are reported all at once; otherwise the first structural
/// error aborts the parse.
pub fn parse(filename: &str, source: &str) -> Result<FileSyntax, ErrorList<SyntaxError>> {
    let tokens = tokenize(filename, source)?;
    let mut parser = Parser::new(filename, &tokens);
    parser
        .parse_file()
        .map_err(|err| ErrorList::from(vec![err]))?;

    let suffix_comments = tokens
        .iter()
        .filter(|tok| tok.kind == TokenKind::SuffixComment)
        .map(|tok| Comment::new(tok.start, tok.text, true))
        .collect();
    let mut file = parser.file;
    assign_comments(&mut file, suffix_comments);
    Ok(file)
}

/// Parse raw bytes, rejecting input that is not UTF-8
pub fn parse_bytes(filename: &str, data: &[u8]) -> Result<FileSyntax, ErrorList<SyntaxError>> {
    match std::str::from_utf8(data) {
        Ok(source) => parse(filename, source),
        Err(err) => {
            let valid = &data[..err.valid_up_to()];
            let mut pos = Position::start();
            pos.advance(std::str::from_utf8(valid).unwrap_or_default());
            Err(ErrorList::from(vec![SyntaxError::new(
                filename,
                pos,
                ErrorCode::E0101,
                "invalid UTF-8 encoding",
            )]))
        }
    }
}

/// The parser state
struct Parser<'t, 'a> {
    filename: &'a str,
    /// Always ends with an `Eof` token
    tokens: &'t [Token<'a>],
    pos: usize,
    file: FileSyntax,
}

impl<'t, 'a> Parser<'t, 'a> {
    fn new(filename: &'a str, tokens: &'t [Token<'a>]) -> Self {
        Self {
            filename,
            tokens,
            pos: 0,
            file: FileSyntax::new(filename),
        }
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn peek_token(&self) -> &'t Token<'a> {
        let tokens: &'t [Token<'a>] = self.tokens;
        &tokens[self.pos.min(tokens.len() - 1)]
    }

    fn peek(&self) -> TokenKind {
        self.peek_token().kind
    }

    /// Consume the next token; `Eof` is never consumed
    fn lex(&mut self) -> &'t Token<'a> {
        let tok = self.peek_token();
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    fn error(&self, pos: Position, code: ErrorCode, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.filename, pos, code, message)
    }

    // =========================================================================
    // Grammar
    // =========================================================================

    fn parse_file(&mut self) -> Result<(), SyntaxError> {
        let mut pending: Option<CommentBlock> = None;
        loop {
            match self.peek() {
                TokenKind::Newline => {
                    self.lex();
                    if let Some(block) = pending.take() {
                        self.file.stmts.push(Stmt::Comments(block));
                    }
                }
                TokenKind::Comment => {
                    let tok = self.lex();
                    let block = pending.get_or_insert_with(|| CommentBlock {
                        start: tok.start,
                        ..CommentBlock::default()
                    });
                    block
                        .comments
                        .before
                        .push(Comment::new(tok.start, tok.text, false));
                }
                TokenKind::Eof => {
                    if let Some(block) = pending.take() {
                        self.file.stmts.push(Stmt::Comments(block));
                    }
                    return Ok(());
                }
                _ => {
                    self.parse_stmt()?;
                    if let Some(block) = pending.take() {
                        let last = self.file.stmts.len() - 1;
                        self.file.stmt_comments_mut(last).before = block.comments.before;
                    }
                }
            }
        }
    }

    fn parse_stmt(&mut self) -> Result<(), SyntaxError> {
        let first = self.lex();
        let start = first.start;
        let mut end = first.end;
        let mut tokens = vec![SmolStr::new(first.text)];
        loop {
            let tok = self.lex();
            match tok.kind {
                kind if kind.is_eol() => {
                    let id = self.file.alloc_line(Line {
                        start,
                        tokens,
                        end,
                        ..Line::default()
                    });
                    self.file.stmts.push(Stmt::Line(id));
                    return Ok(());
                }
                TokenKind::LParen => {
                    let next = self.peek();
                    if next.is_eol() {
                        // start of block: nothing else on this line
                        let block = self.parse_line_block(start, tokens, tok)?;
                        self.file.stmts.push(Stmt::Block(block));
                        return Ok(());
                    }
                    if next == TokenKind::RParen {
                        let rparen = self.lex();
                        if self.peek().is_eol() {
                            self.lex();
                            self.file.stmts.push(Stmt::Block(LineBlock {
                                start,
                                tokens,
                                lparen: LParen {
                                    pos: tok.start,
                                    ..LParen::default()
                                },
                                rparen: RParen {
                                    pos: rparen.start,
                                    ..RParen::default()
                                },
                                ..LineBlock::default()
                            }));
                            return Ok(());
                        }
                        // `( )` mid-line is two plain tokens
                        tokens.push(SmolStr::new(tok.text));
                        tokens.push(SmolStr::new(rparen.text));
                    } else {
                        tokens.push(SmolStr::new(tok.text));
                    }
                }
                _ => {
                    tokens.push(SmolStr::new(tok.text));
                    end = tok.end;
                }
            }
        }
    }

    fn parse_line_block(
        &mut self,
        start: Position,
        tokens: Vec<SmolStr>,
        lparen: &Token<'a>,
    ) -> Result<LineBlock, SyntaxError> {
        let mut block = LineBlock {
            start,
            tokens,
            lparen: LParen {
                pos: lparen.start,
                ..LParen::default()
            },
            ..LineBlock::default()
        };
        let mut comments: Vec<Comment> = Vec::new();
        loop {
            match self.peek() {
                TokenKind::SuffixComment => {
                    // attached later by the comment assigner
                    self.lex();
                }
                TokenKind::Newline => {
                    self.lex();
                    // keep blank lines as empty placeholder comments
                    let after_line = comments.is_empty() && !block.lines.is_empty();
                    let after_comment = comments.last().is_some_and(|c| !c.is_placeholder());
                    if after_line || after_comment {
                        comments.push(Comment::default());
                    }
                }
                TokenKind::Comment => {
                    let tok = self.lex();
                    comments.push(Comment::new(tok.start, tok.text, false));
                }
                TokenKind::Eof => {
                    let eof = self.peek_token();
                    return Err(self.error(
                        eof.start,
                        ErrorCode::E0201,
                        format!(
                            "syntax error (unterminated block started at {}:{}:{})",
                            self.filename, start.line, start.column
                        ),
                    ));
                }
                TokenKind::RParen => {
                    let rparen = self.lex();
                    block.rparen = RParen {
                        comments: Comments {
                            before: comments,
                            ..Comments::default()
                        },
                        pos: rparen.start,
                    };
                    let next = self.peek_token();
                    if !next.kind.is_eol() {
                        return Err(self.error(
                            next.start,
                            ErrorCode::E0202,
                            ErrorCode::E0202.default_message(),
                        ));
                    }
                    self.lex();
                    return Ok(block);
                }
                _ => {
                    let id = self.parse_line()?;
                    self.file.line_mut(id).comments.before = std::mem::take(&mut comments);
                    block.lines.push(id);
                }
            }
        }
    }

    fn parse_line(&mut self) -> Result<LineId, SyntaxError> {
        let first = self.lex();
        if first.kind.is_eol() {
            return Err(self.error(
                first.start,
                ErrorCode::E0999,
                "internal parse error: parse_line at end of line",
            ));
        }
        let start = first.start;
        let mut end = first.end;
        let mut tokens = vec![SmolStr::new(first.text)];
        loop {
            let tok = self.lex();
            if tok.kind.is_eol() {
                return Ok(self.file.alloc_line(Line {
                    start,
                    tokens,
                    in_block: true,
                    end,
                    ..Line::default()
                }));
            }
            tokens.push(SmolStr::new(tok.text));
            end = tok.end;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> FileSyntax {
        parse("gno.mod", source).unwrap()
    }

    #[test]
    fn test_parse_single_lines() {
        let file = parse_ok("module gno.land/p/demo/x\nrequire a.b/c v1.0.0\n");
        assert_eq!(file.stmts.len(), 2);
        let Stmt::Line(id) = &file.stmts[1] else {
            panic!("expected a line");
        };
        assert_eq!(file.line(*id).tokens, vec!["require", "a.b/c", "v1.0.0"]);
        assert!(!file.line(*id).in_block);
    }

    #[test]
    fn test_parse_block() {
        let file = parse_ok("require (\n\ta.b/c v1.0.0\n\td.e/f v2.0.0\n)\n");
        let Stmt::Block(block) = &file.stmts[0] else {
            panic!("expected a block");
        };
        assert_eq!(block.verb(), "require");
        assert_eq!(block.lines.len(), 2);
        assert!(file.line(block.lines[1]).in_block);
        assert_eq!(file.line(block.lines[1]).tokens, vec!["d.e/f", "v2.0.0"]);
        assert_eq!(block.rparen.pos.line, 4);
    }

    #[test]
    fn test_parse_empty_block() {
        let file = parse_ok("require ( )\n");
        let Stmt::Block(block) = &file.stmts[0] else {
            panic!("expected a block");
        };
        assert!(block.lines.is_empty());
    }

    #[test]
    fn test_parens_mid_line_are_tokens() {
        let file = parse_ok("x ( ) y\nz ( w\n");
        let Stmt::Line(first) = &file.stmts[0] else {
            panic!("expected a line");
        };
        assert_eq!(file.line(*first).tokens, vec!["x", "(", ")", "y"]);
        let Stmt::Line(second) = &file.stmts[1] else {
            panic!("expected a line");
        };
        assert_eq!(file.line(*second).tokens, vec!["z", "(", "w"]);
    }

    #[test]
    fn test_blank_line_in_block_becomes_placeholder() {
        let file = parse_ok("require (\n\ta v1.0.0\n\n\tb v1.0.0\n)\n");
        let Stmt::Block(block) = &file.stmts[0] else {
            panic!("expected a block");
        };
        let before = &file.line(block.lines[1]).comments.before;
        assert_eq!(before.len(), 1);
        assert!(before[0].is_placeholder());
    }

    #[test]
    fn test_comment_block_attaches_to_next_stmt() {
        let file = parse_ok("// first\n// second\nmodule x\n\n// alone\n\nrequire y v1.0.0\n");
        assert_eq!(file.stmts.len(), 3);
        assert_eq!(file.stmt_comments(0).before.len(), 2);
        assert!(matches!(file.stmts[1], Stmt::Comments(_)));
        assert!(file.stmt_comments(2).before.is_empty());
    }

    #[test]
    fn test_unterminated_block() {
        let errs = parse("gno.mod", "module x\nrequire (\n\ta v1.0.0\n").unwrap_err();
        assert_eq!(errs.len(), 1);
        let err = errs.first().unwrap();
        assert_eq!(err.code, ErrorCode::E0201);
        assert!(
            err.message
                .contains("unterminated block started at gno.mod:2:1")
        );
    }

    #[test]
    fn test_tokens_after_closing_paren() {
        let errs = parse("gno.mod", "require (\n\ta v1.0.0\n) x\n").unwrap_err();
        assert_eq!(
            errs.first().unwrap().to_string(),
            "gno.mod:3:3: syntax error (expected newline after closing paren)"
        );
    }

    #[test]
    fn test_invalid_utf8() {
        let errs = parse_bytes("gno.mod", b"module \xff\n").unwrap_err();
        assert_eq!(errs.first().unwrap().pos.column, 8);
    }
}
