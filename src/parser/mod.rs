//! Lossless parser for manifest files
//!
//! This module turns manifest text into a generic, line-oriented syntax tree
//! and back:
//! - **logos** for fast lexing
//! - a recursive-descent parser building an arena tree of lines and blocks
//! - a comment assigner attaching every comment to a nearby node
//! - a printer producing the canonical text form
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos) → Tokens with positions, all lexical errors collected
//!     ↓
//! Parser → FileSyntax (statements + line arena)
//!     ↓
//! Comment assigner → comments moved onto nodes
//!     ↓
//! Printer → canonical text
//! ```
//!
//! The tree has no notion of directives; see [`crate::syntax`] for the
//! manifest model built on top of it.

#[allow(clippy::module_inception)]
mod parser;

pub mod ast;
mod comments;
pub mod errors;
mod lexer;
mod printer;

pub use ast::{
    Comment, CommentBlock, Comments, FileSyntax, LParen, Line, LineBlock, LineId, RParen, Stmt,
};
pub use comments::assign_comments;
pub use errors::{ErrorCode, ErrorList, SyntaxError};
pub use lexer::{Lexer, Token, TokenKind, tokenize};
pub use parser::{parse, parse_bytes};
pub use printer::format;
