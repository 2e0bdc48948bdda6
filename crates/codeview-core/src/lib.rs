//! # Codeview Core
//!
//! Turns marked page elements into read-only, highlighted code viewers.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       Initializer                         │
//! │                                                           │
//! │   setup (sync)                 load_all (local tasks)     │
//! │  ┌──────────────┐             ┌─────────────────────────┐ │
//! │  │ Page         │  bindings   │ task 1: fetch → settle  │ │
//! │  │  .code  ─────┼────────────▶│ task 2: fetch → settle  │ │
//! │  │  .code  ─────┤             │ task 3: fetch → settle  │ │
//! │  └──────────────┘             └─────────────────────────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Each `ViewerBinding` pairs one element with one `CodeViewer`. Setup
//! finishes for every element before the first fetch starts; after that
//! each binding loads on its own and never looks at the others.

pub mod binding;
pub mod config;
pub mod fetch;
pub mod initializer;
pub mod page;
pub mod render;
pub mod theme;
pub mod widget;

pub use binding::{
    derive_mode, parse_requested_line, ElementConfig, Phase, SetupError, ViewerBinding,
    ViewerSummary,
};
pub use config::{ConfigError, PageConfig, ViewerConfig, ViewerSettings};
pub use fetch::{Fetch, FetchError, FetchResult, Resolved, SiteFetcher};
pub use initializer::Initializer;
pub use page::{Element, ElementHandle, Em, Page, PageError, PageResult, Style};
pub use render::{render, RenderOptions};
pub use theme::Theme;
pub use widget::CodeViewer;
