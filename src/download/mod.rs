//! Sequential image download pipeline.
//!
//! Images are fetched one at a time, in extraction order, and written to
//! `<destination>/<position>.<extension>`. A failed image is recorded and the
//! run moves on; earlier files are never rolled back. Progress is reported as
//! [`DownloadEvent`]s so the UI stays out of this module.

mod destination;
mod types;

pub use destination::ensure_destination;
pub use types::{DownloadConfig, DownloadEvent, DownloadOutcome, DownloadSummary, FetchError};

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use url::Url;

use crate::error::GalleryError;

/// Downloads resource lists into a destination directory.
pub struct Downloader {
    client: Client,
    config: DownloadConfig,
}

impl Downloader {
    pub fn new(config: DownloadConfig) -> Result<Self, GalleryError> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .gzip(true)
            .brotli(true);

        // Only the resolved proxy is used, never one picked up from the environment
        builder = match config.proxy {
            Some(ref proxy) => builder.proxy(reqwest::Proxy::all(proxy)?),
            None => builder.no_proxy(),
        };

        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    /// Output path for the image at 1-based `position`.
    pub fn file_path(&self, destination: &Path, position: usize) -> PathBuf {
        destination.join(format!("{}.{}", position, self.config.extension))
    }

    /// Download every resource in order.
    ///
    /// Never fails as a whole: per-image errors end up in the summary.
    pub async fn fetch_all(
        &self,
        resources: &[String],
        destination: &Path,
        event_tx: Option<&mpsc::Sender<DownloadEvent>>,
    ) -> DownloadSummary {
        let mut summary = DownloadSummary::default();
        emit(
            event_tx,
            DownloadEvent::Planned {
                total: resources.len(),
                destination: destination.to_path_buf(),
            },
        )
        .await;

        for (index, url) in resources.iter().enumerate() {
            let position = index + 1;
            emit(
                event_tx,
                DownloadEvent::Started {
                    position,
                    url: url.clone(),
                },
            )
            .await;

            let path = self.file_path(destination, position);
            let outcome = match self.fetch_one(url, &path).await {
                Ok(bytes) => {
                    debug!("Saved {} ({} bytes) to {}", url, bytes, path.display());
                    emit(
                        event_tx,
                        DownloadEvent::Saved {
                            position,
                            path: path.clone(),
                            bytes,
                        },
                    )
                    .await;
                    DownloadOutcome::Saved(path)
                }
                Err(e) => {
                    error!("Failed to download image {}: {}", url, e);
                    emit(
                        event_tx,
                        DownloadEvent::Failed {
                            position,
                            url: url.clone(),
                            error: e.to_string(),
                        },
                    )
                    .await;
                    DownloadOutcome::Failed(e)
                }
            };
            summary.outcomes.push(outcome);
        }

        info!(
            "Downloaded {} of {} images to {}",
            summary.saved_count(),
            summary.total(),
            destination.display()
        );
        summary
    }

    /// Stream one image to `path`, returning the number of bytes written.
    ///
    /// The body goes to a `.part` sibling that replaces `path` only once the
    /// transfer is complete, so a failure leaves any earlier file untouched.
    pub async fn fetch_one(&self, url: &str, path: &Path) -> Result<u64, FetchError> {
        if url.trim().is_empty() {
            return Err(FetchError::MissingLocation);
        }
        let url = Url::parse(url)?;
        let partial = partial_path(path);

        let transfer = self.transfer(url, &partial, path);
        let result = match self.config.item_timeout {
            Some(limit) => match tokio::time::timeout(limit, transfer).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(limit)),
            },
            None => transfer.await,
        };

        if result.is_err() {
            // The file may not exist if the request never got a body
            let _ = tokio::fs::remove_file(&partial).await;
        }
        result
    }

    async fn transfer(&self, url: Url, partial: &Path, path: &Path) -> Result<u64, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let mut file = tokio::fs::File::create(partial).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        tokio::fs::rename(partial, path).await?;
        Ok(written)
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

async fn emit(event_tx: Option<&mpsc::Sender<DownloadEvent>>, event: DownloadEvent) {
    if let Some(tx) = event_tx {
        let _ = tx.send(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_path_uses_position_and_extension() {
        let downloader = Downloader::new(DownloadConfig::default()).unwrap();
        let path = downloader.file_path(Path::new("/tmp/dior_spring"), 12);
        assert_eq!(path, PathBuf::from("/tmp/dior_spring/12.jpg"));
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("out/3.jpg")),
            PathBuf::from("out/3.jpg.part")
        );
    }

    #[tokio::test]
    async fn test_malformed_url_fails_without_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Downloader::new(DownloadConfig::default()).unwrap();
        let path = dir.path().join("1.jpg");

        let err = downloader.fetch_one("not a url", &path).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_summary_counts() {
        let summary = DownloadSummary {
            outcomes: vec![
                DownloadOutcome::Saved(PathBuf::from("1.jpg")),
                DownloadOutcome::Failed(FetchError::Status(404)),
                DownloadOutcome::Saved(PathBuf::from("3.jpg")),
            ],
        };
        assert_eq!(summary.saved_count(), 2);
        assert_eq!(summary.failed_count(), 1);
        assert_eq!(summary.total(), 3);
    }

    #[tokio::test]
    async fn test_empty_location_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Downloader::new(DownloadConfig::default()).unwrap();

        let err = downloader
            .fetch_one("", &dir.path().join("2.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::MissingLocation));
    }

    #[test]
    fn test_bad_proxy_is_an_http_error() {
        let result = Downloader::new(DownloadConfig {
            proxy: Some("http://[::1".to_string()),
            ..Default::default()
        });
        assert!(matches!(result, Err(GalleryError::Http(_))));
    }
}
