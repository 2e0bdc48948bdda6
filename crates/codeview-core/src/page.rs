//! Page model: elements, their attributes and their style.
//!
//! ## Learning: Shared Ownership with `Rc` and `Weak`
//!
//! The page owns its elements through `Rc<Element>`. Viewers only need to
//! reach the element they are bound to, never to keep it alive, so they hold
//! a `Weak<Element>`. Once the page is dropped every `Weak::upgrade` returns
//! `None` and late work has nothing left to touch.
//!
//! Styles change after the page is built (a viewer resizes its element), so
//! they live in a `RefCell`. Everything here runs on one thread; the borrow
//! is never held across an `.await`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::{Deserialize, Serialize, Serializer};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Result type for page operations
pub type PageResult<T> = Result<T, PageError>;

/// Errors that can occur while loading a page.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("Failed to read page {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed markup at byte {position}: {source}")]
    Markup {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },
}

/// A length in `em`, relative to the element's font size.
///
/// The exact value is kept; display and serialization round it to
/// thousandths so `1.1 * 3` reads `3.3em`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
pub struct Em(pub f64);

impl Em {
    pub fn value(self) -> f64 {
        self.0
    }

    /// The value rounded to three decimals.
    pub fn rounded(self) -> f64 {
        (self.0 * 1000.0).round() / 1000.0
    }
}

impl std::fmt::Display for Em {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}em", self.rounded())
    }
}

impl Serialize for Em {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.rounded())
    }
}

/// Inline style an element carries. Unset properties are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Style {
    pub font_size: Option<Em>,
    pub height: Option<Em>,
}

/// A single node of the page.
#[derive(Debug)]
pub struct Element {
    tag: String,
    /// Attribute names are stored lowercase, in source order
    attributes: Vec<(String, String)>,
    style: RefCell<Style>,
}

/// Owning handle to an element, as stored by the page.
pub type ElementHandle = Rc<Element>;

impl Element {
    /// Creates an element without attributes.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            style: RefCell::new(Style::default()),
        }
    }

    /// Adds an attribute (builder style).
    pub fn with_attr(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    fn set_attr(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        let name = name.as_ref().to_ascii_lowercase();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns an attribute value. Names match case-insensitively.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if the `class` attribute contains the token.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Returns a copy of the current style.
    pub fn style(&self) -> Style {
        *self.style.borrow()
    }

    pub fn set_font_size(&self, size: Em) {
        self.style.borrow_mut().font_size = Some(size);
    }

    pub fn set_height(&self, height: Em) {
        self.style.borrow_mut().height = Some(height);
    }
}

/// A loaded page: its elements in document order and the location relative
/// paths are resolved against.
#[derive(Debug)]
pub struct Page {
    base: PathBuf,
    elements: Vec<ElementHandle>,
}

impl Page {
    /// Creates an empty page rooted at `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            elements: Vec::new(),
        }
    }

    /// Appends an element and returns its handle.
    pub fn push(&mut self, element: Element) -> ElementHandle {
        let handle = Rc::new(element);
        self.elements.push(Rc::clone(&handle));
        handle
    }

    /// Reads a markup file. Its directory becomes the page base.
    pub async fn load(path: impl AsRef<Path>) -> PageResult<Self> {
        let path = path.as_ref();
        let markup = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| PageError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let base = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::parse(&markup, base)
    }

    /// Parses HTML or XHTML markup.
    ///
    /// Only element structure and attributes matter here, so mismatched end
    /// tags (`<br>`, unclosed `<p>`) are tolerated.
    pub fn parse(markup: &str, base: impl Into<PathBuf>) -> PageResult<Self> {
        let mut page = Self::new(base);
        let mut reader = Reader::from_str(markup);
        reader.config_mut().check_end_names = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    page.push(element_from_start(&e));
                }
                Ok(Event::Eof) => break,
                Err(source) => {
                    return Err(PageError::Markup {
                        position: reader.buffer_position() as u64,
                        source,
                    });
                }
                _ => {}
            }
        }

        tracing::debug!("Parsed page with {} elements", page.len());
        Ok(page)
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Returns all elements in document order.
    pub fn elements(&self) -> &[ElementHandle] {
        &self.elements
    }

    /// Returns elements carrying a class token, in document order.
    pub fn elements_with_class<'a>(
        &'a self,
        class: &'a str,
    ) -> impl Iterator<Item = &'a ElementHandle> + 'a {
        self.elements.iter().filter(move |e| e.has_class(class))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Element {
    let tag = String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase();
    let mut element = Element::new(tag);

    // HTML allows unquoted and valueless attributes
    for attr in start.html_attributes().flatten() {
        let name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = match attr.unescape_value() {
            Ok(v) => v.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        element.set_attr(name, value);
    }

    element
}
