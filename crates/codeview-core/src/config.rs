//! Viewer configuration.
//!
//! Read from `<config dir>/codeview/config.toml` when present. Every field
//! has a default (`#[serde(default)]`), so a file only lists what it
//! changes:
//!
//! ```toml
//! [page]
//! selector_class = "listing"
//!
//! [viewer]
//! line_jump = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main viewer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// How qualifying elements are found and read
    pub page: PageConfig,

    /// How each viewer looks and behaves
    pub viewer: ViewerSettings,
}

impl ViewerConfig {
    /// Loads config from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::load_from_default_path() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config: {}", e);
                Self::default()
            }
        }
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads from the default config path.
    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("codeview").join("config.toml"))
    }

    /// Saves the config to a file, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Which elements qualify and which attributes configure them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Class token that marks an element for code-viewer treatment
    pub selector_class: String,

    /// Required attribute naming the file to fetch
    pub source_attribute: String,

    /// Optional attribute overriding the extension-derived mode
    pub mode_attribute: String,

    /// Optional attribute with the 1-based line to jump to
    pub line_attribute: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            selector_class: "code".to_string(),
            source_attribute: "data-src-file".to_string(),
            mode_attribute: "data-file-type".to_string(),
            line_attribute: "data-line".to_string(),
        }
    }
}

/// Per-viewer presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    /// Color theme name
    pub theme: String,

    /// Base font size in em
    pub font_size: f64,

    /// Extra em added to each line's height when sizing the element
    pub line_padding: f64,

    /// Text shown while the file loads
    pub placeholder: String,

    /// Text shown when the file cannot be loaded
    pub fallback: String,

    /// Jump to the element's requested line after loading
    pub line_jump: bool,
}

impl ViewerSettings {
    /// Height of one rendered line in em.
    pub fn line_height(&self) -> f64 {
        self.font_size + self.line_padding
    }
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            theme: "monokai".to_string(),
            font_size: 1.0,
            line_padding: 0.1,
            placeholder: "Loading...".to_string(),
            fallback: "contents not available".to_string(),
            line_jump: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
