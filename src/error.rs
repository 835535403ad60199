//! Error types for gallery retrieval.

use thiserror::Error;

use crate::browser::BrowserError;

/// Errors that can abort a collection run.
///
/// Control-lookup misses and per-image transport failures are not represented
/// here: they are expected outcomes and are absorbed where they happen.
#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("Failed to start browser session: {0}")]
    SessionInit(#[source] BrowserError),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GalleryError {
    pub fn config(message: impl Into<String>) -> Self {
        GalleryError::Config(message.into())
    }

    /// Whether the error happened before any page interaction took place.
    pub fn is_session_init(&self) -> bool {
        matches!(self, GalleryError::SessionInit(_))
    }
}

pub type Result<T> = std::result::Result<T, GalleryError>;
