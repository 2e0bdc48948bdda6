//! The read-only code viewer widget.
//!
//! ## Learning: Composition over Inheritance
//!
//! `CodeViewer` composes a `TextBuffer` (what is shown), an optional
//! `Highlighter` (how it is colored) and a weak link to the page element
//! it draws into. Each piece stays small and testable on its own.

use codeview_buffer::{Position, TextBuffer};
use codeview_syntax::{HighlightSpan, Highlighter};
use std::rc::{Rc, Weak};

use crate::page::{Element, ElementHandle};

/// A read-only code display bound to one page element.
pub struct CodeViewer {
    /// Element this viewer draws into
    element: Weak<Element>,

    /// Displayed text
    buffer: TextBuffer,

    /// Theme name
    theme: String,

    /// Highlighting mode, as given by the page
    mode: String,

    /// Parser for `mode`, if a grammar is bundled for it
    highlighter: Option<Highlighter>,

    /// Highlights of the current text
    spans: Vec<HighlightSpan>,

    read_only: bool,

    /// Cursor position (0-indexed)
    cursor: Position,

    /// Topmost line in view (0-indexed)
    scroll_top: usize,

    /// Number of lines the element can show at its current height
    visible_rows: usize,

    /// Extra em per line on top of the font size
    line_padding: f64,
}

impl CodeViewer {
    /// Creates a viewer bound to an element.
    pub fn bind(element: &ElementHandle) -> Self {
        Self {
            element: Rc::downgrade(element),
            buffer: TextBuffer::new(),
            theme: String::new(),
            mode: String::new(),
            highlighter: None,
            spans: Vec::new(),
            read_only: false,
            cursor: Position::ZERO,
            scroll_top: 0,
            visible_rows: 1,
            line_padding: 0.0,
        }
    }

    pub fn set_theme(&mut self, theme: impl Into<String>) {
        self.theme = theme.into();
    }

    /// Sets the highlighting mode.
    ///
    /// A mode without a bundled grammar is kept as-is and shows plain text.
    pub fn set_mode(&mut self, mode: impl Into<String>) {
        self.mode = mode.into();
        self.highlighter = match Highlighter::for_mode(&self.mode) {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::debug!("Plain text for mode {:?}: {}", self.mode, e);
                None
            }
        };
        self.rehighlight();
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn set_line_padding(&mut self, padding: f64) {
        self.line_padding = padding;
    }

    /// Replaces the displayed text and moves the cursor to the start.
    ///
    /// Works regardless of the read-only flag: read-only only forbids
    /// editing by the reader, not content updates by the page.
    pub fn set_value(&mut self, text: &str) {
        self.buffer.set_text(text);
        self.cursor = Position::ZERO;
        self.scroll_top = 0;
        self.rehighlight();
    }

    fn rehighlight(&mut self) {
        self.spans = match &mut self.highlighter {
            Some(highlighter) => {
                let text = self.buffer.text();
                match highlighter.parse(&text) {
                    Ok(()) => highlighter.highlight(),
                    Err(e) => {
                        tracing::debug!("Highlighting skipped: {}", e);
                        Vec::new()
                    }
                }
            }
            None => Vec::new(),
        };
    }

    /// Recomputes layout from the element's current size.
    ///
    /// Does nothing once the element is gone.
    pub fn resize(&mut self) {
        let Some(element) = self.element.upgrade() else {
            return;
        };
        let style = element.style();
        let font_size = style.font_size.map(|f| f.value()).unwrap_or(1.0);
        let height = style.height.map(|h| h.value()).unwrap_or(0.0);
        let line_height = font_size + self.line_padding;

        let rows = if line_height > 0.0 {
            // Round first so 1.1 * 10 / 1.1 counts as 10 rows, not 9.99...
            ((height / line_height) * 1e6).round() / 1e6
        } else {
            0.0
        };
        self.visible_rows = (rows.floor() as usize).max(1);
    }

    /// Moves the cursor to the start of a 1-based line and scrolls it to
    /// the top of the view. Out-of-range lines are clamped.
    pub fn goto_line(&mut self, line: usize) {
        self.cursor = self.buffer.clamp_line(line);
        self.scroll_top = self.cursor.line;
    }

    // ==================== Getters ====================

    /// Returns the bound element while the page is alive.
    pub fn element(&self) -> Option<ElementHandle> {
        self.element.upgrade()
    }

    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        self.buffer.text()
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// Number of lines in the displayed text.
    pub fn line_count(&self) -> usize {
        self.buffer.len_lines()
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Returns true if a bundled grammar highlights the current mode.
    pub fn is_highlighted(&self) -> bool {
        self.highlighter.is_some()
    }

    pub fn spans(&self) -> &[HighlightSpan] {
        &self.spans
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    /// Topmost line in view, 1-based.
    pub fn first_visible_line(&self) -> usize {
        self.scroll_top + 1
    }

    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }
}

impl std::fmt::Debug for CodeViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeViewer")
            .field("mode", &self.mode)
            .field("theme", &self.theme)
            .field("lines", &self.line_count())
            .field("cursor", &self.cursor)
            .field("scroll_top", &self.scroll_top)
            .finish()
    }
}
