//! # Content Sources
//!
//! Where page fragments come from. The router asks for `<pageId>.html`; the
//! source decides whether that means an HTTP GET, a file read, or a lookup in
//! the fragments compiled into the binary.
//!
//! ```text
//! ContentSource (trait)
//! ├── HttpContentSource      GET <base>/<path>
//! ├── DirContentSource       <dir>/<path>
//! └── EmbeddedContentSource  include_str!("pages/<path>")
//! ```

use std::fmt;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use log::debug;

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ContentError {
    NotFound(String),
    Status { path: String, status: u16 },
    Network(String),
    Io(std::io::Error),
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentError::NotFound(path) => write!(f, "content not found: {path}"),
            ContentError::Status { path, status } => {
                write!(f, "failed to load {path}: HTTP {status}")
            }
            ContentError::Network(msg) => write!(f, "network error: {msg}"),
            ContentError::Io(e) => write!(f, "content I/O error: {e}"),
        }
    }
}

impl std::error::Error for ContentError {}

// ============================================================================
// Trait
// ============================================================================

#[async_trait]
pub trait ContentSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, path: &str) -> Result<String, ContentError>;
}

// ============================================================================
// HTTP
// ============================================================================

pub struct HttpContentSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpContentSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, path: &str) -> Result<String, ContentError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ContentError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| ContentError::Network(e.to_string()))
    }
}

// ============================================================================
// Directory
// ============================================================================

pub struct DirContentSource {
    dir: PathBuf,
}

impl DirContentSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Resolve `path` under the directory, refusing anything that would
    /// escape it.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes { None } else { Some(self.dir.join(relative)) }
    }
}

#[async_trait]
impl ContentSource for DirContentSource {
    fn name(&self) -> &str {
        "dir"
    }

    async fn fetch(&self, path: &str) -> Result<String, ContentError> {
        let full = self
            .resolve(path)
            .ok_or_else(|| ContentError::NotFound(path.to_string()))?;
        match tokio::fs::read_to_string(&full).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ContentError::NotFound(path.to_string()))
            }
            Err(e) => Err(ContentError::Io(e)),
        }
    }
}

// ============================================================================
// Embedded
// ============================================================================

const EMBEDDED_PAGES: &[(&str, &str)] = &[
    ("index.html", include_str!("../../pages/index.html")),
    ("home.html", include_str!("../../pages/home.html")),
    ("trip-planner.html", include_str!("../../pages/trip-planner.html")),
    ("country-info.html", include_str!("../../pages/country-info.html")),
    ("safety.html", include_str!("../../pages/safety.html")),
    ("packing.html", include_str!("../../pages/packing.html")),
    ("currency.html", include_str!("../../pages/currency.html")),
    ("documents.html", include_str!("../../pages/documents.html")),
    ("maps.html", include_str!("../../pages/maps.html")),
];

/// Fragments compiled into the binary.
#[derive(Default)]
pub struct EmbeddedContentSource;

impl EmbeddedContentSource {
    pub fn get(path: &str) -> Option<&'static str> {
        let path = path.trim_start_matches('/');
        EMBEDDED_PAGES
            .iter()
            .find(|(name, _)| *name == path)
            .map(|(_, contents)| *contents)
    }
}

#[async_trait]
impl ContentSource for EmbeddedContentSource {
    fn name(&self) -> &str {
        "embedded"
    }

    async fn fetch(&self, path: &str) -> Result<String, ContentError> {
        Self::get(path)
            .map(str::to_string)
            .ok_or_else(|| ContentError::NotFound(path.to_string()))
    }
}
