//! Color themes for viewers.
//!
//! Viewers only store a theme *name*; the palette is looked up when text is
//! drawn. Unknown names fall back to [`Theme::monokai`].

use codeview_syntax::HighlightKind;

/// 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// ANSI escape selecting this color as foreground.
    pub fn ansi_fg(&self) -> String {
        format!("\x1b[38;2;{};{};{}m", self.r, self.g, self.b)
    }
}

/// Syntax highlighting colors.
#[derive(Debug, Clone)]
pub struct SyntaxColors {
    pub keyword: Rgb,
    pub string: Rgb,
    pub number: Rgb,
    pub comment: Rgb,
    pub function: Rgb,
    pub type_name: Rgb,
    pub constant: Rgb,
    pub operator: Rgb,
    pub attribute: Rgb,
    pub property: Rgb,
}

/// A viewer theme.
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: &'static str,
    pub background: Rgb,
    pub foreground: Rgb,
    pub gutter: Rgb,
    pub syntax: SyntaxColors,
}

impl Theme {
    /// The Monokai palette.
    pub fn monokai() -> Self {
        Self {
            name: "monokai",
            background: Rgb::new(0x27, 0x28, 0x22),
            foreground: Rgb::new(0xf8, 0xf8, 0xf2),
            gutter: Rgb::new(0x90, 0x90, 0x8a),
            syntax: SyntaxColors {
                keyword: Rgb::new(0xf9, 0x26, 0x72),
                string: Rgb::new(0xe6, 0xdb, 0x74),
                number: Rgb::new(0xae, 0x81, 0xff),
                comment: Rgb::new(0x75, 0x71, 0x5e),
                function: Rgb::new(0xa6, 0xe2, 0x2e),
                type_name: Rgb::new(0x66, 0xd9, 0xef),
                constant: Rgb::new(0xae, 0x81, 0xff),
                operator: Rgb::new(0xf9, 0x26, 0x72),
                attribute: Rgb::new(0xa6, 0xe2, 0x2e),
                property: Rgb::new(0xfd, 0x97, 0x1f),
            },
        }
    }

    /// Looks a theme up by name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "monokai" => Some(Self::monokai()),
            _ => None,
        }
    }

    /// Like [`Theme::by_name`], but never fails.
    pub fn resolve(name: &str) -> Self {
        Self::by_name(name).unwrap_or_else(|| {
            tracing::debug!("Unknown theme {:?}, using monokai", name);
            Self::monokai()
        })
    }

    /// Returns the color for a kind of syntax element.
    pub fn color(&self, kind: HighlightKind) -> Rgb {
        let s = &self.syntax;
        match kind {
            HighlightKind::Keyword => s.keyword,
            HighlightKind::String => s.string,
            HighlightKind::Number => s.number,
            HighlightKind::Comment => s.comment,
            HighlightKind::Function => s.function,
            HighlightKind::Type => s.type_name,
            HighlightKind::Constant => s.constant,
            HighlightKind::Operator => s.operator,
            HighlightKind::Attribute => s.attribute,
            HighlightKind::Property => s.property,
            HighlightKind::None => self.foreground,
        }
    }
}
