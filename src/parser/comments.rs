//! Comment assignment.
//!
//! Two lists of all syntax nodes are built: preorder (ordered by start, outer
//! nodes first) and postorder (ordered by end, outer nodes last). Whole-line
//! comments go to the node immediately following them, found by walking the
//! preorder list; end-of-line comments go to the node immediately preceding
//! them, found by walking the postorder list backwards.

use crate::base::Position;

use super::ast::{Comment, Comments, FileSyntax, LineId, Stmt, past};

/// A node of the syntax tree, addressed through its file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeRef {
    File,
    Line(LineId),
    Block(usize),
    LParen(usize),
    RParen(usize),
    CommentBlock(usize),
}

fn order(file: &FileSyntax) -> (Vec<NodeRef>, Vec<NodeRef>) {
    let mut pre = vec![NodeRef::File];
    let mut post = Vec::new();
    for (i, stmt) in file.stmts.iter().enumerate() {
        match stmt {
            Stmt::Line(id) => {
                pre.push(NodeRef::Line(*id));
                post.push(NodeRef::Line(*id));
            }
            Stmt::Comments(_) => {
                pre.push(NodeRef::CommentBlock(i));
                post.push(NodeRef::CommentBlock(i));
            }
            Stmt::Block(block) => {
                pre.push(NodeRef::Block(i));
                pre.push(NodeRef::LParen(i));
                post.push(NodeRef::LParen(i));
                for id in &block.lines {
                    pre.push(NodeRef::Line(*id));
                    post.push(NodeRef::Line(*id));
                }
                pre.push(NodeRef::RParen(i));
                post.push(NodeRef::RParen(i));
                post.push(NodeRef::Block(i));
            }
        }
    }
    post.push(NodeRef::File);
    (pre, post)
}

fn stmt_span(file: &FileSyntax, index: usize) -> (Position, Position) {
    match &file.stmts[index] {
        Stmt::Line(id) => {
            let line = file.line(*id);
            (line.start, line.end)
        }
        Stmt::Block(block) => (block.start, block.end()),
        Stmt::Comments(block) => (block.start, block.start),
    }
}

fn span(file: &FileSyntax, node: NodeRef) -> (Position, Position) {
    let block = |i: usize| match &file.stmts[i] {
        Stmt::Block(block) => Some(block),
        _ => None,
    };
    match node {
        NodeRef::File => {
            if file.stmts.is_empty() {
                return (Position::default(), Position::default());
            }
            let (start, _) = stmt_span(file, 0);
            let (_, end) = stmt_span(file, file.stmts.len() - 1);
            (start, end)
        }
        NodeRef::Line(id) => {
            let line = file.line(id);
            (line.start, line.end)
        }
        NodeRef::Block(i) | NodeRef::CommentBlock(i) => stmt_span(file, i),
        NodeRef::LParen(i) => block(i).map_or_else(Default::default, |b| {
            (b.lparen.pos, past(b.lparen.pos, "("))
        }),
        NodeRef::RParen(i) => block(i).map_or_else(Default::default, |b| {
            (b.rparen.pos, past(b.rparen.pos, ")"))
        }),
    }
}

fn comments_mut(file: &mut FileSyntax, node: NodeRef) -> Option<&mut Comments> {
    match node {
        NodeRef::File => Some(&mut file.comments),
        NodeRef::Line(id) => Some(&mut file.line_mut(id).comments),
        NodeRef::Block(i) | NodeRef::CommentBlock(i) => Some(file.stmt_comments_mut(i)),
        NodeRef::LParen(i) => match &mut file.stmts[i] {
            Stmt::Block(block) => Some(&mut block.lparen.comments),
            _ => None,
        },
        NodeRef::RParen(i) => match &mut file.stmts[i] {
            Stmt::Block(block) => Some(&mut block.rparen.comments),
            _ => None,
        },
    }
}

/// Attach `comments` to the nodes of `file`
///
/// Every comment ends up in exactly one list: a node's `before` or `suffix`
/// list, or the file's own lists for comments no node claims (leftover
/// whole-line comments go after the file, leftover suffix comments before).
pub fn assign_comments(file: &mut FileSyntax, comments: Vec<Comment>) {
    let (pre, post) = order(file);
    let (line, mut suffix): (Vec<Comment>, Vec<Comment>) =
        comments.into_iter().partition(|c| !c.suffix);

    // Whole-line comments go to the syntax immediately following.
    let mut line = line.into_iter().peekable();
    for &node in &pre {
        let (start, _) = span(file, node);
        while let Some(com) = line.next_if(|c| start.offset >= c.start.offset) {
            if let Some(xcom) = comments_mut(file, node) {
                xcom.before.push(com);
            }
        }
    }
    file.comments.after.extend(line);

    // Suffix comments go to the syntax immediately before.
    for &node in post.iter().rev() {
        if node == NodeRef::File {
            continue;
        }
        let (start, end) = span(file, node);
        // a construct spanning lines cannot own an end-of-line comment;
        // its last line does
        if start.line != end.line {
            continue;
        }
        while suffix
            .last()
            .is_some_and(|c| end.offset <= c.start.offset)
        {
            let Some(com) = suffix.pop() else { break };
            if let Some(xcom) = comments_mut(file, node) {
                xcom.suffix.push(com);
            }
        }
    }

    // Suffix comments were taken from the end; restore source order.
    for &node in &post {
        if let Some(xcom) = comments_mut(file, node) {
            xcom.suffix.reverse();
        }
    }

    tracing::trace!(file = %file.name, leftover = suffix.len(), "assigned comments");
    file.comments.before.extend(suffix);
}

#[cfg(test)]
mod tests {
    use crate::parser::{Stmt, parse};

    #[test]
    fn test_suffix_comment_on_line() {
        let file = parse("gno.mod", "module x // main\nrequire y v1.0.0 // indirect\n").unwrap();
        assert_eq!(file.stmt_comments(0).suffix[0].text, "// main");
        assert_eq!(file.stmt_comments(1).suffix[0].text, "// indirect");
    }

    #[test]
    fn test_suffix_comments_in_block() {
        let source = "require ( // opener\n\ta v1.0.0 // first\n\tb v1.0.0\n) // closer\n";
        let file = parse("gno.mod", source).unwrap();
        let Stmt::Block(block) = &file.stmts[0] else {
            panic!("expected a block");
        };
        assert_eq!(block.lparen.comments.suffix[0].text, "// opener");
        assert_eq!(file.line(block.lines[0]).comments.suffix[0].text, "// first");
        assert!(file.line(block.lines[1]).comments.suffix.is_empty());
        assert_eq!(block.rparen.comments.suffix[0].text, "// closer");
        assert!(block.comments.suffix.is_empty());
    }

    #[test]
    fn test_comment_count_is_conserved() {
        let source = "// head\nmodule x // m\n\nrequire (\n\t// before a\n\ta v1.0.0 // a\n\n\t// trailing\n)\n// tail\n";
        let file = parse("gno.mod", source).unwrap();
        let lexed = source.matches("//").count();
        assert_eq!(file.comment_count(), lexed);
    }
}
