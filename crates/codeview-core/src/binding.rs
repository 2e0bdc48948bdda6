//! Bindings between page elements and their viewers.
//!
//! ## Learning: Parse, Don't Validate
//!
//! Element attributes are untyped strings. [`ElementConfig::extract`] reads
//! them once and turns them into a typed record, so the rest of the code
//! never has to ask "is this attribute there?" again.

use codeview_buffer::Position;
use serde::Serialize;
use std::rc::{Rc, Weak};

use crate::config::{PageConfig, ViewerSettings};
use crate::fetch::FetchResult;
use crate::page::{Element, ElementHandle, Em};
use crate::widget::CodeViewer;

/// Why an element could not be set up for loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("Element has no {attribute} attribute")]
    MissingSourcePath { attribute: String },
}

/// Configuration read from one qualifying element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementConfig {
    /// Location to fetch
    pub source_path: String,

    /// Highlighting mode
    pub syntax_mode: String,

    /// Raw line attribute, read only when line jumps are enabled
    pub requested_line: Option<String>,
}

impl ElementConfig {
    /// Reads an element's attributes.
    ///
    /// The source attribute is required; an empty value counts as missing.
    pub fn extract(
        element: &Element,
        page: &PageConfig,
        line_jump: bool,
    ) -> Result<Self, SetupError> {
        let source_path = element
            .attr(&page.source_attribute)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SetupError::MissingSourcePath {
                attribute: page.source_attribute.clone(),
            })?
            .to_string();

        let syntax_mode = derive_mode(&source_path, element.attr(&page.mode_attribute));

        let requested_line = if line_jump {
            element.attr(&page.line_attribute).map(str::to_string)
        } else {
            None
        };

        Ok(Self {
            source_path,
            syntax_mode,
            requested_line,
        })
    }

    /// The 1-based line to jump to after loading.
    pub fn target_line(&self) -> usize {
        parse_requested_line(self.requested_line.as_deref())
    }
}

/// Picks the highlighting mode for a source path.
///
/// A non-empty override wins. Otherwise the mode is whatever follows the
/// last `.` of the path, or the whole path when it has no `.`.
///
/// ```
/// use codeview_core::derive_mode;
///
/// assert_eq!(derive_mode("a/b/file.rs", None), "rs");
/// assert_eq!(derive_mode("x.txt", Some("python")), "python");
/// ```
pub fn derive_mode(source_path: &str, override_mode: Option<&str>) -> String {
    match override_mode {
        Some(mode) if !mode.is_empty() => mode.to_string(),
        _ => source_path
            .rsplit('.')
            .next()
            .unwrap_or(source_path)
            .to_string(),
    }
}

/// Parses a requested line number. Anything that is not a positive
/// integer means line 1.
pub fn parse_requested_line(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|&line| line > 0)
        .unwrap_or(1)
}

/// Lifecycle of a binding. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Loading,
    Loaded,
    Failed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Loading => "loading",
            Phase::Loaded => "loaded",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One qualifying element, its viewer and its configuration.
///
/// Holds the element weakly: the page owns it.
#[derive(Debug)]
pub struct ViewerBinding {
    /// Position among the page's qualifying elements
    index: usize,
    element: Weak<Element>,
    viewer: CodeViewer,
    config: Result<ElementConfig, SetupError>,
    phase: Phase,
}

impl ViewerBinding {
    /// Creates the viewer for an element and puts it in its loading state.
    ///
    /// An element without a source path still gets its viewer; it shows
    /// the fallback text right away and is never fetched.
    pub fn setup(
        index: usize,
        element: &ElementHandle,
        page: &PageConfig,
        settings: &ViewerSettings,
    ) -> Self {
        let config = ElementConfig::extract(element, page, settings.line_jump);
        let mut viewer = CodeViewer::bind(element);

        viewer.set_theme(settings.theme.as_str());
        if let Ok(config) = &config {
            viewer.set_mode(config.syntax_mode.as_str());
        }
        viewer.set_read_only(true);
        viewer.set_line_padding(settings.line_padding);
        viewer.set_value(&settings.placeholder);

        element.set_font_size(Em(settings.font_size));
        element.set_height(Em(settings.font_size));
        viewer.resize();

        let phase = match &config {
            Ok(config) => {
                tracing::debug!(
                    "Viewer #{} set up for {} ({})",
                    index,
                    config.source_path,
                    config.syntax_mode
                );
                Phase::Loading
            }
            Err(e) => {
                tracing::warn!("Viewer #{} not loaded: {}", index, e);
                viewer.set_value(&settings.fallback);
                Phase::Failed
            }
        };

        Self {
            index,
            element: Rc::downgrade(element),
            viewer,
            config,
            phase,
        }
    }

    /// Returns the location to fetch while the binding is still loading.
    pub fn pending_location(&self) -> Option<&str> {
        match (&self.config, self.phase) {
            (Ok(config), Phase::Loading) => Some(config.source_path.as_str()),
            _ => None,
        }
    }

    /// Applies the outcome of the fetch.
    ///
    /// Only a loading binding can settle, and only once. If the element was
    /// torn down in the meantime the result is dropped and the binding
    /// stays in its loading state.
    pub fn settle(&mut self, result: FetchResult<String>, settings: &ViewerSettings) {
        if self.phase != Phase::Loading {
            return;
        }
        let Some(element) = self.element.upgrade() else {
            tracing::debug!("Viewer #{} element is gone, dropping result", self.index);
            return;
        };

        match result {
            Ok(body) => {
                self.viewer.set_value(&body);
                let lines = self.viewer.line_count();
                element.set_height(Em(settings.line_height() * lines as f64));
                self.viewer.resize();

                if settings.line_jump {
                    let line = self
                        .config
                        .as_ref()
                        .map(ElementConfig::target_line)
                        .unwrap_or(1);
                    self.viewer.goto_line(line);
                }

                tracing::debug!("Viewer #{} loaded {} lines", self.index, lines);
                self.phase = Phase::Loaded;
            }
            Err(e) => {
                tracing::warn!("Viewer #{}: {}", self.index, e);
                self.viewer.set_value(&settings.fallback);
                self.phase = Phase::Failed;
            }
        }
    }

    // ==================== Getters ====================

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn viewer(&self) -> &CodeViewer {
        &self.viewer
    }

    /// Returns the bound element while the page is alive.
    pub fn element(&self) -> Option<ElementHandle> {
        self.element.upgrade()
    }

    /// Snapshot of the binding for reporting.
    pub fn summary(&self) -> ViewerSummary {
        let (source, mode) = match &self.config {
            Ok(config) => (
                Some(config.source_path.clone()),
                Some(config.syntax_mode.clone()),
            ),
            Err(_) => (None, None),
        };

        ViewerSummary {
            index: self.index,
            source,
            mode,
            phase: self.phase,
            height: self.element().and_then(|e| e.style().height),
            lines: self.viewer.line_count(),
            first_visible_line: self.viewer.first_visible_line(),
            cursor: self.viewer.cursor(),
        }
    }
}

/// Serializable snapshot of a binding's final state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerSummary {
    pub index: usize,
    pub source: Option<String>,
    pub mode: Option<String>,
    pub phase: Phase,
    pub height: Option<Em>,
    pub lines: usize,
    pub first_visible_line: usize,
    pub cursor: Position,
}

impl std::fmt::Display for ViewerSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {} [{}] {}",
            self.index,
            self.source.as_deref().unwrap_or("<no source>"),
            self.mode.as_deref().unwrap_or("-"),
            self.phase
        )?;
        if let Some(height) = self.height {
            write!(f, " height={height}")?;
        }
        write!(f, " lines={} top={}", self.lines, self.first_visible_line)
    }
}
