//! # Codeview Buffer
//!
//! Text storage behind a code viewer widget.
//!
//! ## Key Concepts
//!
//! ### Ownership & Borrowing
//! - `TextBuffer` owns the rope holding the displayed text
//! - Methods like `text()` return borrowed data (`Cow<str>`)
//! - Replacing the content requires `&mut self` (exclusive access)
//!
//! ### Read-only by construction
//! - A viewer never edits text in place, it only replaces all of it
//! - There is no undo history: a replacement is final

mod buffer;
mod cursor;

pub use buffer::TextBuffer;
pub use cursor::Position;

/// Result type for buffer operations
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer operations
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("Line {line} is out of bounds (buffer has {len} lines)")]
    LineOutOfBounds { line: usize, len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_creation() {
        let buffer = TextBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len_chars(), 0);
        assert_eq!(buffer.len_lines(), 1);
    }

    #[test]
    fn test_buffer_from_string() {
        let buffer = TextBuffer::from("Hello, World!");
        assert_eq!(buffer.len_chars(), 13);
        assert_eq!(buffer.text(), "Hello, World!");
    }

    #[test]
    fn test_replace_content() {
        let mut buffer = TextBuffer::from("Loading...");
        buffer.set_text("fn main() {}\n");
        assert_eq!(buffer.text(), "fn main() {}\n");
        assert_eq!(buffer.len_lines(), 2);
    }

    #[test]
    fn test_line_operations() {
        let buffer = TextBuffer::from("Line 1\nLine 2\nLine 3");
        assert_eq!(buffer.len_lines(), 3);
        assert_eq!(buffer.line(0).unwrap(), "Line 1\n");
        assert_eq!(buffer.line(1).unwrap(), "Line 2\n");
        assert_eq!(buffer.line(2).unwrap(), "Line 3");
        assert!(matches!(
            buffer.line(3),
            Err(BufferError::LineOutOfBounds { line: 3, len: 3 })
        ));
    }
}
