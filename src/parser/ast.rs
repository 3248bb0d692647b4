//! Line-oriented syntax tree for manifest files
//!
//! The tree knows nothing about directives: a file is a sequence of
//! statements, each a single [`Line`], a parenthesized [`LineBlock`] of lines,
//! or a free-standing [`CommentBlock`].
//!
//! Lines live in an arena owned by [`FileSyntax`] and are addressed by
//! [`LineId`]. Ids stay valid for the life of the file, even after the line is
//! removed from the statement list, so model entries can hold on to the line
//! they were decoded from.

use smol_str::SmolStr;

use crate::base::Position;

/// Stable handle to a line in a [`FileSyntax`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(u32);

impl LineId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single `//` comment, or an empty placeholder for a blank line
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Comment {
    pub start: Position,
    /// Text including the leading `//`; empty for a blank-line placeholder
    pub text: String,
    /// Whether the comment followed other tokens on its line
    pub suffix: bool,
}

impl Comment {
    pub fn new(start: Position, text: impl Into<String>, suffix: bool) -> Self {
        Self {
            start,
            text: text.into(),
            suffix,
        }
    }

    /// Comment text without the `//` marker and surrounding space
    pub fn body(&self) -> &str {
        self.text.strip_prefix("//").unwrap_or(&self.text).trim()
    }

    pub fn is_placeholder(&self) -> bool {
        self.text.is_empty()
    }
}

/// Comments attached to a syntax node
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Comments {
    /// Whole-line comments before the node
    pub before: Vec<Comment>,
    /// End-of-line comments after the node
    pub suffix: Vec<Comment>,
    /// Whole-line comments after the node
    pub after: Vec<Comment>,
}

impl Comments {
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.suffix.is_empty() && self.after.is_empty()
    }

    pub fn len(&self) -> usize {
        self.before.len() + self.suffix.len() + self.after.len()
    }

    /// Number of comments that came from the source, placeholders excluded
    pub fn source_len(&self) -> usize {
        self.before
            .iter()
            .chain(&self.suffix)
            .chain(&self.after)
            .filter(|c| !c.is_placeholder())
            .count()
    }
}

/// A line of tokens, either top-level or inside a block
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    pub comments: Comments,
    pub start: Position,
    /// Raw token text, quotes included
    pub tokens: Vec<SmolStr>,
    /// Lines inside a block omit the block's keyword
    pub in_block: bool,
    pub end: Position,
}

impl Line {
    pub fn new(tokens: Vec<SmolStr>, in_block: bool) -> Self {
        Self {
            tokens,
            in_block,
            ..Self::default()
        }
    }

    /// A removed line has no tokens and is dropped by cleanup
    pub fn is_removed(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Opening paren of a block
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LParen {
    pub comments: Comments,
    pub pos: Position,
}

/// Closing paren of a block
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RParen {
    pub comments: Comments,
    pub pos: Position,
}

/// A factored block such as `require ( ... )`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineBlock {
    pub comments: Comments,
    pub start: Position,
    /// The keyword tokens before `(`
    pub tokens: Vec<SmolStr>,
    pub lparen: LParen,
    pub lines: Vec<LineId>,
    pub rparen: RParen,
}

impl LineBlock {
    /// The block's directive keyword
    pub fn verb(&self) -> &str {
        self.tokens.first().map_or("", SmolStr::as_str)
    }

    /// Span end: just past the closing paren
    pub fn end(&self) -> Position {
        past(self.rparen.pos, ")")
    }
}

/// A run of whole-line comments not attached to any directive
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentBlock {
    pub comments: Comments,
    pub start: Position,
}

/// A top-level statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Line(LineId),
    Block(LineBlock),
    Comments(CommentBlock),
}

/// Parsed manifest: statements plus the line arena
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileSyntax {
    pub name: String,
    /// File-level comments (leftover suffix comments before, standalone after)
    pub comments: Comments,
    pub stmts: Vec<Stmt>,
    lines: Vec<Line>,
}

impl FileSyntax {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Move `line` into the arena
    pub fn alloc_line(&mut self, line: Line) -> LineId {
        let id = LineId(self.lines.len() as u32);
        self.lines.push(line);
        id
    }

    pub fn line(&self, id: LineId) -> &Line {
        &self.lines[id.index()]
    }

    pub fn line_mut(&mut self, id: LineId) -> &mut Line {
        &mut self.lines[id.index()]
    }

    /// Comments attached to a statement
    pub fn stmt_comments(&self, index: usize) -> &Comments {
        match &self.stmts[index] {
            Stmt::Line(id) => &self.line(*id).comments,
            Stmt::Block(block) => &block.comments,
            Stmt::Comments(block) => &block.comments,
        }
    }

    pub fn stmt_comments_mut(&mut self, index: usize) -> &mut Comments {
        match &mut self.stmts[index] {
            Stmt::Line(id) => &mut self.lines[id.index()].comments,
            Stmt::Block(block) => &mut block.comments,
            Stmt::Comments(block) => &mut block.comments,
        }
    }

    /// Lines reachable from the statement list, in document order
    pub fn live_lines(&self) -> impl Iterator<Item = LineId> + '_ {
        self.stmts.iter().flat_map(|stmt| match stmt {
            Stmt::Line(id) => std::slice::from_ref(id).iter().copied(),
            Stmt::Block(block) => block.lines.iter().copied(),
            Stmt::Comments(_) => <&[LineId]>::default().iter().copied(),
        })
    }

    /// Number of source comments attached anywhere in the file
    pub fn comment_count(&self) -> usize {
        let mut n = self.comments.source_len();
        for stmt in &self.stmts {
            match stmt {
                Stmt::Line(id) => n += self.line(*id).comments.source_len(),
                Stmt::Block(block) => {
                    n += block.comments.source_len()
                        + block.lparen.comments.source_len()
                        + block.rparen.comments.source_len();
                    n += block
                        .lines
                        .iter()
                        .map(|id| self.line(*id).comments.source_len())
                        .sum::<usize>();
                }
                Stmt::Comments(block) => n += block.comments.source_len(),
            }
        }
        n
    }
}

/// Position just past `text` starting at `pos`
pub(crate) fn past(pos: Position, text: &str) -> Position {
    let mut end = pos;
    end.advance(text);
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_ids_are_stable() {
        let mut file = FileSyntax::new("gno.mod");
        let a = file.alloc_line(Line::new(vec!["module".into(), "a".into()], false));
        let b = file.alloc_line(Line::new(vec!["require".into()], false));
        file.stmts.push(Stmt::Line(b));
        file.stmts.push(Stmt::Line(a));
        file.stmts.remove(0);
        assert_eq!(file.line(a).tokens[1], "a");
        assert_eq!(file.line(b).tokens[0], "require");
        assert_eq!(file.live_lines().collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn test_comment_body() {
        let c = Comment::new(Position::start(), "//   Deprecated: use v2  ", false);
        assert_eq!(c.body(), "Deprecated: use v2");
        assert!(Comment::default().is_placeholder());
    }

    #[test]
    fn test_block_verb() {
        let block = LineBlock {
            tokens: vec!["require".into()],
            ..LineBlock::default()
        };
        assert_eq!(block.verb(), "require");
    }
}
