//! Canonical manifest printer
//!
//! Blocks are indented with one tab per level and tokens are separated by
//! single spaces. Comments are written at the margin of the node they belong
//! to; suffix comments are queued until the end of the line.

use smol_str::SmolStr;

use super::ast::{Comment, CommentBlock, FileSyntax, Line, LineBlock, Stmt};

/// Render `file` in canonical form
pub fn format(file: &FileSyntax) -> String {
    let mut printer = Printer::default();
    printer.file(file);
    let mut out = printer.buf;
    // remove trailing blank lines
    while out.ends_with('\n') && (out.len() == 1 || out[..out.len() - 1].ends_with('\n')) {
        out.pop();
    }
    out
}

#[derive(Default)]
struct Printer {
    buf: String,
    /// Pending end-of-line comments
    pending: Vec<String>,
    /// Left margin in tabs
    margin: usize,
}

enum Node<'f> {
    Line(&'f Line),
    Block(&'f LineBlock),
    Comments(&'f CommentBlock),
}

impl Printer {
    /// Column of the write position on the current line
    fn indent(&self) -> usize {
        self.buf.len() - self.buf.rfind('\n').map_or(0, |i| i + 1)
    }

    fn tabs(&mut self) {
        for _ in 0..self.margin {
            self.buf.push('\t');
        }
    }

    /// Remove trailing spaces and tabs
    fn trim(&mut self) {
        let len = self.buf.trim_end_matches([' ', '\t']).len();
        self.buf.truncate(len);
    }

    /// Flush pending suffix comments and start a new line at the margin
    fn newline(&mut self) {
        if !self.pending.is_empty() {
            self.buf.push(' ');
            let pending = std::mem::take(&mut self.pending);
            for (i, com) in pending.iter().enumerate() {
                if i > 0 {
                    self.trim();
                    self.buf.push('\n');
                    self.tabs();
                }
                self.buf.push_str(com);
            }
        }

        self.trim();
        // no blank line at the top of the file or after another blank line
        if !(self.buf.is_empty() || self.buf.ends_with("\n\n")) {
            self.buf.push('\n');
        }
        self.tabs();
    }

    fn comment(&mut self, com: &Comment) {
        self.buf.push_str(com.text.trim());
        self.newline();
    }

    fn file(&mut self, file: &FileSyntax) {
        for com in &file.comments.before {
            self.comment(com);
        }

        for (i, stmt) in file.stmts.iter().enumerate() {
            match stmt {
                // comment blocks end with their own newline
                Stmt::Comments(block) => self.expr(file, Node::Comments(block)),
                Stmt::Line(id) => {
                    self.expr(file, Node::Line(file.line(*id)));
                    self.newline();
                }
                Stmt::Block(block) => {
                    self.expr(file, Node::Block(block));
                    self.newline();
                }
            }

            for com in &file.stmt_comments(i).after {
                self.comment(com);
            }

            if i + 1 < file.stmts.len() {
                self.newline();
            }
        }

        for com in &file.comments.after {
            self.comment(com);
        }
    }

    fn before(&mut self, before: &[Comment]) {
        if before.is_empty() {
            return;
        }
        // line comments must be at the current margin
        self.trim();
        if self.indent() > 0 {
            self.buf.push('\n');
        }
        self.tabs();
        for com in before {
            self.comment(com);
        }
    }

    fn queue(&mut self, suffix: &[Comment]) {
        self.pending
            .extend(suffix.iter().map(|c| c.text.trim().to_string()));
    }

    fn expr(&mut self, file: &FileSyntax, node: Node<'_>) {
        match node {
            Node::Comments(block) => {
                self.before(&block.comments.before);
                self.queue(&block.comments.suffix);
            }
            Node::Line(line) => {
                self.before(&line.comments.before);
                self.tokens(&line.tokens);
                self.queue(&line.comments.suffix);
            }
            Node::Block(block) => {
                self.before(&block.comments.before);
                self.tokens(&block.tokens);
                self.buf.push(' ');

                self.before(&block.lparen.comments.before);
                self.buf.push('(');
                self.queue(&block.lparen.comments.suffix);

                self.margin += 1;
                for id in &block.lines {
                    self.newline();
                    self.expr(file, Node::Line(file.line(*id)));
                }
                self.margin -= 1;
                self.newline();

                self.before(&block.rparen.comments.before);
                self.buf.push(')');
                self.queue(&block.rparen.comments.suffix);
                self.queue(&block.comments.suffix);
            }
        }
    }

    fn tokens(&mut self, tokens: &[SmolStr]) {
        let mut sep = "";
        for tok in tokens {
            if matches!(tok.as_str(), "," | ")" | "]" | "}") {
                sep = "";
            }
            self.buf.push_str(sep);
            self.buf.push_str(tok);
            sep = " ";
            if matches!(tok.as_str(), "(" | "[" | "{") {
                sep = "";
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_normalizes_spacing() {
        let file = parse("gno.mod", "module   x\nrequire (\n    a   v1.0.0\n)\n").unwrap();
        assert_eq!(format(&file), "module x\n\nrequire (\n\ta v1.0.0\n)\n");
    }

    #[test]
    fn test_collapses_blank_lines() {
        let file = parse("gno.mod", "module x\n\n\n\nrequire a v1.0.0\n\n\n").unwrap();
        assert_eq!(format(&file), "module x\n\nrequire a v1.0.0\n");
    }

    #[test]
    fn test_punctuation_spacing() {
        let file = parse("gno.mod", "x [ a , b ] { c }\n").unwrap();
        assert_eq!(format(&file), "x [a, b] {c}\n");
    }

    #[test]
    fn test_empty_file() {
        assert_eq!(format(&FileSyntax::new("gno.mod")), "");
    }
}
