//! Loading source files for viewers.
//!
//! ## Learning: Async I/O
//!
//! File and network I/O are slow compared to everything else a viewer does.
//! Reading through `tokio::fs` and `reqwest` lets every viewer's load make
//! progress on the same thread without one slow source holding up the
//! others.
//!
//! Bodies are decoded leniently: invalid UTF-8 becomes U+FFFD instead of an
//! error, so a Latin-1 source file still shows up.

use std::future::Future;
use std::path::PathBuf;

use percent_encoding::percent_decode_str;
use reqwest::{Client, StatusCode, Url};

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Why a source could not be fetched.
///
/// Viewers treat every variant the same way; the distinction only shows up
/// in logs.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported location: {0}")]
    UnsupportedScheme(String),

    #[error("Failed to read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Request for {location} failed: {source}")]
    Http {
        location: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{location} answered {status}")]
    Status {
        location: String,
        status: StatusCode,
    },

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Retrieves the body of a location as text.
pub trait Fetch {
    fn fetch_text(&self, location: &str) -> impl Future<Output = FetchResult<String>>;
}

/// Where a location points once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    File(PathBuf),
    Remote(Url),
}

/// Fetches locations the way a browser on a static site would.
///
/// - `path/to/file` and `./file` resolve against the root
/// - `/path` resolves against the root as well (site-absolute)
/// - `%XX` escapes in paths are decoded, `.` and `..` segments are folded
/// - `file:///abs/path` is read as given
/// - `http://` and `https://` URLs are requested with a GET
/// - any other `scheme://` location is unsupported
#[derive(Debug, Clone)]
pub struct SiteFetcher {
    root: PathBuf,
    client: Client,
}

impl SiteFetcher {
    pub fn new(root: impl Into<PathBuf>) -> FetchResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("codeview/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self::with_client(root, client))
    }

    /// Uses a preconfigured HTTP client (proxies, timeouts).
    pub fn with_client(root: impl Into<PathBuf>, client: Client) -> Self {
        Self {
            root: root.into(),
            client,
        }
    }

    /// Maps a location to a file path or a URL.
    pub fn resolve(&self, location: &str) -> FetchResult<Resolved> {
        if let Some((scheme, _)) = location.split_once("://") {
            return match scheme.to_ascii_lowercase().as_str() {
                "http" | "https" => Url::parse(location)
                    .map(Resolved::Remote)
                    .map_err(|_| FetchError::NotFound(location.to_string())),
                "file" => {
                    let path = strip_query(&location[scheme.len() + 3..]);
                    Ok(Resolved::File(decode_path(PathBuf::from("/"), path, location)?))
                }
                _ => Err(FetchError::UnsupportedScheme(location.to_string())),
            };
        }

        let path = strip_query(location);
        if path.is_empty() {
            return Err(FetchError::NotFound(location.to_string()));
        }
        decode_path(self.root.clone(), path, location).map(Resolved::File)
    }

    async fn read_file(&self, location: &str, path: PathBuf) -> FetchResult<String> {
        tracing::trace!("Reading {} from {}", location, path.display());
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| match source.kind() {
                std::io::ErrorKind::NotFound => FetchError::NotFound(location.to_string()),
                _ => FetchError::Io {
                    location: location.to_string(),
                    source,
                },
            })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn get(&self, location: &str, url: Url) -> FetchResult<String> {
        tracing::trace!("GET {}", url);
        let http_error = |source| FetchError::Http {
            location: location.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(http_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                location: location.to_string(),
                status,
            });
        }
        let body = response.bytes().await.map_err(http_error)?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

impl Fetch for SiteFetcher {
    async fn fetch_text(&self, location: &str) -> FetchResult<String> {
        match self.resolve(location)? {
            Resolved::File(path) => self.read_file(location, path).await,
            Resolved::Remote(url) => self.get(location, url).await,
        }
    }
}

/// Query strings and fragments do not name a different file.
fn strip_query(location: &str) -> &str {
    location.split(['?', '#']).next().unwrap_or_default()
}

/// Appends the decoded segments of a URL path to `base`. `..` never climbs
/// above `base`.
fn decode_path(mut base: PathBuf, path: &str, location: &str) -> FetchResult<PathBuf> {
    let floor = base.components().count();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if base.components().count() > floor {
                    base.pop();
                }
            }
            _ => {
                let decoded = percent_decode_str(segment)
                    .decode_utf8()
                    .map_err(|_| FetchError::NotFound(location.to_string()))?;
                base.push(&*decoded);
            }
        }
    }
    Ok(base)
}
