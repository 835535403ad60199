//! Download pipeline types and events.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Events emitted during a download run.
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    /// Run is about to start with `total` images
    Planned { total: usize, destination: PathBuf },
    /// Transfer started for the image at `position` (1-based)
    Started { position: usize, url: String },
    /// Image written to disk
    Saved {
        position: usize,
        path: PathBuf,
        bytes: u64,
    },
    /// Transfer failed; the run continues with the next image
    Failed {
        position: usize,
        url: String,
        error: String,
    },
}

/// Result for a single image.
#[derive(Debug)]
pub enum DownloadOutcome {
    Saved(PathBuf),
    Failed(FetchError),
}

impl DownloadOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, DownloadOutcome::Saved(_))
    }
}

/// Why a single transfer failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("image has no source location")]
    MissingLocation,

    #[error("invalid image URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Aggregate result of a download run.
#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub outcomes: Vec<DownloadOutcome>,
}

impl DownloadSummary {
    pub fn saved_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_saved()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.saved_count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// Configuration for the download pipeline.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Extension given to every saved file.
    pub extension: String,
    /// Bound on a single transfer. `None` waits indefinitely.
    pub item_timeout: Option<Duration>,
    /// Proxy applied to image requests.
    pub proxy: Option<String>,
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            extension: "jpg".to_string(),
            item_timeout: Some(Duration::from_secs(60)),
            proxy: None,
            user_agent: concat!("runway-gallery/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
