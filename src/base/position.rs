//! Position tracking for manifest tokens and syntax nodes
//!
//! Lines and columns are 1-based (columns count runes, not bytes); the byte
//! offset is measured from the start of the input. A line of 0 means the
//! position is unknown, which is the case for nodes created by the editor.

use text_size::TextSize;

/// A position in a manifest file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: TextSize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: TextSize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// The position of the first rune of an input
    pub fn start() -> Self {
        Self::new(1, 1, TextSize::new(0))
    }

    /// Whether this position refers to real input
    pub fn is_known(&self) -> bool {
        self.line > 0
    }

    /// Advance past `text`, counting newlines and runes
    pub fn advance(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset += TextSize::of(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_counts_runes_not_bytes() {
        let mut pos = Position::start();
        pos.advance("héllo");
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 6);
        assert_eq!(pos.offset, TextSize::new(6));
    }

    #[test]
    fn test_advance_newline_resets_column() {
        let mut pos = Position::start();
        pos.advance("ab\ncd");
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 3);
        assert_eq!(u32::from(pos.offset), 5);
    }

    #[test]
    fn test_default_position_is_unknown() {
        assert!(!Position::default().is_known());
        assert!(Position::start().is_known());
    }
}
