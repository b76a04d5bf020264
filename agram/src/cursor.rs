//! Source positions for the tokenizer.
//!
//! [`Cursor`] follows the tokenizer through its input one character at a
//! time and keeps the byte offset together with a human-facing line/column
//! [`Position`]. [`Location`] is the snapshot attached to diagnostics.

use std::fmt;

/// A line/column position in source text.
///
/// Lines are 1-based, columns are 0-based (the column counts characters
/// already consumed on the current line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,
    /// 0-based column number (character position in the line).
    pub column: usize,
}

impl Position {
    /// Creates a new `Position`.
    #[inline]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

/// Byte offset plus line/column, as reported in errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Location {
    pub offset: usize,
    pub position: Position,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "offset {} line {} column {}",
            self.offset, self.position.line, self.position.column
        )
    }
}

/// Tracks the current lexical position.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    pub offset: usize,
    pub position: Position,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by consuming a character `c`.
    pub fn advance(&mut self, c: char) {
        if c == '\n' {
            self.position.line += 1;
            self.position.column = 0;
        } else {
            self.position.column += 1;
        }
        self.offset += c.len_utf8();
    }

    /// Advance over every character of `text`.
    pub fn advance_str(&mut self, text: &str) {
        for c in text.chars() {
            self.advance(c);
        }
    }

    pub fn location(&self) -> Location {
        Location {
            offset: self.offset,
            position: self.position,
        }
    }
}
