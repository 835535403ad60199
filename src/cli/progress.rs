//! Download progress display.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use runway_gallery::DownloadEvent;

/// Progress bar driven by [`DownloadEvent`]s.
#[derive(Default)]
pub struct DownloadProgress {
    bar: Option<ProgressBar>,
    failed: usize,
}

impl DownloadProgress {
    pub fn handle(&mut self, event: DownloadEvent) {
        match event {
            DownloadEvent::Planned { total, .. } => {
                let bar = ProgressBar::new(total as u64);
                bar.set_style(bar_style());
                bar.set_message("Downloading images");
                self.bar = Some(bar);
            }
            DownloadEvent::Started { url, .. } => {
                if let Some(ref bar) = self.bar {
                    bar.set_message(truncate_url(&url, 40));
                }
            }
            DownloadEvent::Saved { .. } => {
                if let Some(ref bar) = self.bar {
                    bar.inc(1);
                }
            }
            DownloadEvent::Failed {
                position, error, ..
            } => {
                self.failed += 1;
                if let Some(ref bar) = self.bar {
                    bar.println(format!(
                        "  {} image {}: {}",
                        style("✗").red(),
                        position,
                        error
                    ));
                    bar.inc(1);
                }
            }
        }
    }

    pub fn finish(self) {
        if let Some(bar) = self.bar {
            let message = if self.failed == 0 {
                "Done".to_string()
            } else {
                format!("Done ({} failed)", self.failed)
            };
            bar.finish_with_message(message);
        }
    }
}

/// Render events from `rx` until the sender side is dropped.
pub fn spawn(mut rx: mpsc::Receiver<DownloadEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut progress = DownloadProgress::default();
        while let Some(event) = rx.recv().await {
            progress.handle(event);
        }
        progress.finish();
    })
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} {wide_msg} [{bar:30.cyan/blue}] {pos}/{len}")
        .map(|s| s.progress_chars("█▓░"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Keep the tail of a long URL, which is where the file name lives.
fn truncate_url(url: &str, max_len: usize) -> String {
    let chars: Vec<char> = url.chars().collect();
    if chars.len() <= max_len {
        url.to_string()
    } else {
        let keep = max_len.saturating_sub(3);
        let tail: String = chars[chars.len() - keep..].iter().collect();
        format!("...{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_truncate_url() {
        assert_eq!(truncate_url("https://a.b/1.jpg", 40), "https://a.b/1.jpg");
        let long = "https://assets.vogue.com/photos/0123456789abcdef/master/w_1280/look.jpg";
        let short = truncate_url(long, 20);
        assert_eq!(short.chars().count(), 20);
        assert!(short.starts_with("..."));
        assert!(short.ends_with("look.jpg"));
    }

    #[test]
    fn test_truncate_url_tiny_width() {
        assert_eq!(truncate_url("https://a.b/1.jpg", 2), "...");
        assert_eq!(truncate_url("https://a.b/1.jpg", 0), "...");
    }

    #[test]
    fn test_counts_failures() {
        let mut progress = DownloadProgress::default();
        progress.handle(DownloadEvent::Planned {
            total: 2,
            destination: PathBuf::from("dior_spring"),
        });
        progress.handle(DownloadEvent::Failed {
            position: 1,
            url: "https://a.b/1.jpg".to_string(),
            error: "HTTP 404".to_string(),
        });
        progress.handle(DownloadEvent::Saved {
            position: 2,
            path: PathBuf::from("dior_spring/2.jpg"),
            bytes: 10,
        });
        assert_eq!(progress.failed, 1);
        assert_eq!(progress.bar.as_ref().map(|b| b.position()), Some(2));
    }
}
