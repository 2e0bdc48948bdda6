//! Rope-backed storage for a viewer's text.
//!
//! A viewer asks the same questions over and over: how many lines are there,
//! where does line `n` start, what does line `n` contain. A rope answers all
//! of them in O(log n) without rescanning the text, which keeps resizing and
//! line jumps cheap even for large source files.

use std::borrow::Cow;

use ropey::Rope;

use crate::{BufferError, BufferResult, Position};

/// The text shown by one viewer.
///
/// Content is replaced wholesale through [`TextBuffer::set_text`]; there is
/// no edit history.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    rope: Rope,
}

impl TextBuffer {
    /// Creates an empty buffer.
    ///
    /// # Example
    /// ```
    /// use codeview_buffer::TextBuffer;
    ///
    /// let buffer = TextBuffer::new();
    /// assert!(buffer.is_empty());
    /// assert_eq!(buffer.len_lines(), 1);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole content.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
    }

    /// The full content. Borrowed when the rope is a single chunk.
    pub fn text(&self) -> Cow<'_, str> {
        self.rope.slice(..).into()
    }

    /// Line `idx` (0-indexed), including its newline if it has one.
    pub fn line(&self, idx: usize) -> BufferResult<Cow<'_, str>> {
        self.check_line(idx)?;
        Ok(self.rope.line(idx).into())
    }

    /// Byte offset at which line `idx` (0-indexed) starts.
    pub fn line_to_byte(&self, idx: usize) -> BufferResult<usize> {
        self.check_line(idx)?;
        Ok(self.rope.line_to_byte(idx))
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Number of lines: one more than the number of line breaks (`\n`,
    /// `\r\n` or a lone `\r`), so an empty buffer has one line and a
    /// trailing newline opens an empty last line.
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Returns the start of a 1-based line, clamped into the buffer.
    ///
    /// Line `0` is treated like line `1`; lines past the end land on the
    /// last line.
    pub fn clamp_line(&self, one_based: usize) -> Position {
        let last = self.len_lines().saturating_sub(1);
        Position::new(one_based.saturating_sub(1).min(last), 0)
    }

    fn check_line(&self, idx: usize) -> BufferResult<()> {
        let len = self.len_lines();
        if idx >= len {
            return Err(BufferError::LineOutOfBounds { line: idx, len });
        }
        Ok(())
    }
}

impl From<&str> for TextBuffer {
    fn from(s: &str) -> Self {
        Self {
            rope: Rope::from_str(s),
        }
    }
}

impl From<String> for TextBuffer {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_line_to_byte() {
        let buffer = TextBuffer::from("héllo\nworld");
        assert_eq!(buffer.line_to_byte(0).unwrap(), 0);
        assert_eq!(buffer.line_to_byte(1).unwrap(), 7);
        assert!(buffer.line_to_byte(2).is_err());
    }

    #[test]
    fn test_clamp_line() {
        let buffer = TextBuffer::from("a\nb\nc");
        assert_eq!(buffer.clamp_line(0), Position::new(0, 0));
        assert_eq!(buffer.clamp_line(1), Position::new(0, 0));
        assert_eq!(buffer.clamp_line(3), Position::new(2, 0));
        assert_eq!(buffer.clamp_line(42), Position::new(2, 0));
    }

    #[test]
    fn test_trailing_newline_opens_a_line() {
        assert_eq!(TextBuffer::from("a\nb").len_lines(), 2);
        assert_eq!(TextBuffer::from("a\nb\n").len_lines(), 3);
    }

    #[test]
    fn test_unicode_separators_do_not_break_lines() {
        assert_eq!(TextBuffer::from("int a;\x0c\nint b;").len_lines(), 2);
        assert_eq!(TextBuffer::from("x\u{2028}y\u{85}z").len_lines(), 1);
        assert_eq!(TextBuffer::from("a\x0bb\u{2029}").len_lines(), 1);
    }

    #[test]
    fn test_crlf_is_one_break() {
        let buffer = TextBuffer::from("a\r\nb\r\nc");
        assert_eq!(buffer.len_lines(), 3);
        assert_eq!(buffer.line(1).unwrap(), "b\r\n");
        assert_eq!(TextBuffer::from("a\rb").len_lines(), 2);
    }

    proptest! {
        #[test]
        fn line_count_is_newlines_plus_one(lines in proptest::collection::vec("[a-z ]{0,12}", 1..40)) {
            let text = lines.join("\n");
            let buffer = TextBuffer::from(text.as_str());
            prop_assert_eq!(buffer.len_lines(), lines.len());
        }
    }
}
