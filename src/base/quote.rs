//! Quoting rules for manifest arguments and source string literals.
//!
//! Arguments are written bare unless they contain characters the manifest
//! lexer would split on, in which case they are written as double-quoted
//! strings with backslash escapes.

use thiserror::Error;

/// Failure to unquote a string literal
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid syntax")]
pub struct UnquoteError;

/// Whether `s` cannot be written as a bare manifest argument
pub fn must_quote(s: &str) -> bool {
    let multi = s.chars().nth(1).is_some();
    for c in s.chars() {
        match c {
            ' ' | '"' | '\'' | '`' => return true,
            '(' | ')' | '[' | ']' | '{' | '}' | ',' if multi => return true,
            _ if !is_print(c) => return true,
            _ => {}
        }
    }
    s.is_empty() || s.contains("//") || s.contains("/*")
}

/// Quote `s` only when it cannot be written bare
pub fn auto_quote(s: &str) -> String {
    if must_quote(s) {
        quote(s)
    } else {
        s.to_string()
    }
}

/// Printable runes are written literally; everything else is escaped
pub(crate) fn is_print(c: char) -> bool {
    c == ' ' || (!c.is_control() && !c.is_whitespace())
}

/// Write `s` as a double-quoted literal
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{b}' => out.push_str("\\v"),
            c if is_print(c) => out.push(c),
            c if (c as u32) < 0x80 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c if (c as u32) < 0x10000 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push_str(&format!("\\U{:08x}", c as u32)),
        }
    }
    out.push('"');
    out
}

/// Interpret a double-quoted or back-quoted literal
///
/// Back-quoted literals are raw (carriage returns are dropped); double-quoted
/// literals accept the usual backslash escapes, including `\xNN`, octal
/// `\NNN`, `\uNNNN` and `\UNNNNNNNN`.
pub fn unquote(s: &str) -> Result<String, UnquoteError> {
    let mut chars = s.chars();
    let quote = chars.next().ok_or(UnquoteError)?;
    if s.len() < 2 || !s.ends_with(quote) {
        return Err(UnquoteError);
    }
    let body = &s[1..s.len() - 1];
    match quote {
        '`' => {
            if body.contains('`') {
                return Err(UnquoteError);
            }
            Ok(body.replace('\r', ""))
        }
        '"' => unescape(body),
        _ => Err(UnquoteError),
    }
}

fn unescape(body: &str) -> Result<String, UnquoteError> {
    let mut bytes = Vec::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' | '\n' => return Err(UnquoteError),
            '\\' => {
                let esc = chars.next().ok_or(UnquoteError)?;
                match esc {
                    'a' => bytes.push(0x07),
                    'b' => bytes.push(0x08),
                    'f' => bytes.push(0x0c),
                    'n' => bytes.push(b'\n'),
                    'r' => bytes.push(b'\r'),
                    't' => bytes.push(b'\t'),
                    'v' => bytes.push(0x0b),
                    '\\' => bytes.push(b'\\'),
                    '"' => bytes.push(b'"'),
                    'x' => bytes.push(hex_value(&mut chars, 2)? as u8),
                    'u' => push_char(&mut bytes, hex_value(&mut chars, 4)?)?,
                    'U' => push_char(&mut bytes, hex_value(&mut chars, 8)?)?,
                    '0'..='7' => {
                        let mut value = esc.to_digit(8).ok_or(UnquoteError)?;
                        for _ in 0..2 {
                            let d = chars.next().and_then(|d| d.to_digit(8));
                            value = value * 8 + d.ok_or(UnquoteError)?;
                        }
                        if value > 0xff {
                            return Err(UnquoteError);
                        }
                        bytes.push(value as u8);
                    }
                    _ => return Err(UnquoteError),
                }
            }
            c => {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    String::from_utf8(bytes).map_err(|_| UnquoteError)
}

fn hex_value(chars: &mut std::str::Chars<'_>, digits: usize) -> Result<u32, UnquoteError> {
    let mut value = 0u32;
    for _ in 0..digits {
        let d = chars.next().and_then(|d| d.to_digit(16)).ok_or(UnquoteError)?;
        value = value * 16 + d;
    }
    Ok(value)
}

fn push_char(bytes: &mut Vec<u8>, value: u32) -> Result<(), UnquoteError> {
    let c = char::from_u32(value).ok_or(UnquoteError)?;
    let mut buf = [0u8; 4];
    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    Ok(())
}
