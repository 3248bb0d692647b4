//! Syntax error types
//!
//! Provides:
//! - [`SyntaxError`] carrying file name, position, code and message
//! - [`ErrorList`], the ordered list returned at parse boundaries

use std::fmt;

use crate::base::Position;

use super::codes::ErrorCode;

/// A lexical or structural error in a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// Name of the input, as given to the parser
    pub filename: String,
    /// Where the error was detected
    pub pos: Position,
    /// Categorized error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
}

impl SyntaxError {
    pub fn new(
        filename: impl Into<String>,
        pos: Position,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            pos,
            code,
            message: message.into(),
        }
    }

    /// Create an error using the code's default message
    pub fn from_code(filename: impl Into<String>, pos: Position, code: ErrorCode) -> Self {
        Self::new(filename, pos, code, code.default_message())
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_location(f, &self.filename, self.pos)?;
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SyntaxError {}

/// Write the `file:line:col: ` prefix shared by manifest diagnostics
///
/// The column is omitted when it is 1 and the whole position when the line is
/// unknown.
pub(crate) fn write_location(
    f: &mut fmt::Formatter<'_>,
    filename: &str,
    pos: Position,
) -> fmt::Result {
    if pos.column > 1 {
        write!(f, "{}:{}:{}: ", filename, pos.line, pos.column)
    } else if pos.is_known() {
        write!(f, "{}:{}: ", filename, pos.line)
    } else if !filename.is_empty() {
        write!(f, "{}: ", filename)
    } else {
        Ok(())
    }
}

/// An ordered list of errors, displayed one per line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorList<E>(Vec<E>);

impl<E> ErrorList<E> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, error: E) {
        self.0.push(error);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<&E> {
        self.0.first()
    }

    /// `Ok(value)` when no errors were collected, otherwise the list itself
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }

    pub fn into_vec(self) -> Vec<E> {
        self.0
    }
}

impl<E> Default for ErrorList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> From<Vec<E>> for ErrorList<E> {
    fn from(errors: Vec<E>) -> Self {
        Self(errors)
    }
}

impl<E> IntoIterator for ErrorList<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, E> IntoIterator for &'a ErrorList<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<E> Extend<E> for ErrorList<E> {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl<E: fmt::Display> fmt::Display for ErrorList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for ErrorList<E> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::TextSize;

    fn at(line: usize, column: usize) -> Position {
        Position::new(line, column, TextSize::new(0))
    }

    #[test]
    fn test_syntax_error_display_with_column() {
        let err = SyntaxError::from_code("gno.mod", at(3, 7), ErrorCode::E0103);
        assert_eq!(err.to_string(), "gno.mod:3:7: unexpected newline in string");
    }

    #[test]
    fn test_syntax_error_display_first_column() {
        let err = SyntaxError::new("gno.mod", at(2, 1), ErrorCode::E0901, "boom");
        assert_eq!(err.to_string(), "gno.mod:2: boom");
    }

    #[test]
    fn test_syntax_error_display_unknown_position() {
        let err = SyntaxError::new("gno.mod", Position::default(), ErrorCode::E0999, "boom");
        assert_eq!(err.to_string(), "gno.mod: boom");
    }

    #[test]
    fn test_error_list_display_joins_lines() {
        let mut list = ErrorList::new();
        list.push(SyntaxError::new("a", at(1, 2), ErrorCode::E0101, "first"));
        list.push(SyntaxError::new("a", at(2, 2), ErrorCode::E0101, "second"));
        assert_eq!(list.len(), 2);
        assert_eq!(list.to_string(), "a:1:2: first\na:2:2: second");
    }

    #[test]
    fn test_error_list_into_result() {
        let empty: ErrorList<SyntaxError> = ErrorList::new();
        assert_eq!(empty.into_result(5), Ok(5));
        let full = ErrorList::from(vec![SyntaxError::new("a", at(1, 1), ErrorCode::E0901, "x")]);
        assert!(full.into_result(5).is_err());
    }
}
