//! Rendered-page sessions.
//!
//! The gallery pipeline only talks to the browser through [`PageSession`], so
//! the reveal loop can be driven by Chrome over CDP in production and by a
//! scripted fake in tests.

mod chrome;
mod config;
pub mod scripts;

pub use chrome::ChromeSession;
pub use config::BrowserEngineConfig;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a page session.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error(
        "Chrome/Chromium not found. Please install it:\n\
         - Arch/Manjaro: sudo pacman -S chromium\n\
         - Ubuntu/Debian: sudo apt install chromium-browser\n\
         - Fedora: sudo dnf install chromium\n\
         - Or download from: https://www.google.com/chrome/"
    )]
    ChromeNotFound,

    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Failed to connect to remote browser: {0}")]
    Connect(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Browser session is closed")]
    Closed,

    #[error("Browser support not compiled. Rebuild with: cargo build --features browser")]
    Unavailable,
}

impl BrowserError {
    pub fn navigation(url: &str, message: impl ToString) -> Self {
        BrowserError::Navigation {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    /// True when the failure looks like an unreachable or refusing proxy.
    pub fn is_proxy_failure(&self) -> bool {
        self.to_string().contains("ERR_PROXY_CONNECTION_FAILED")
    }
}

/// How to find an interactive control on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// First element matching a CSS selector.
    Css(String),
    /// A `<button>` holding a `<span>` whose own text contains the label.
    ButtonText(String),
}

/// Result of waiting for a control to become clickable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlLookup {
    /// The control became clickable within the bound and was clicked.
    Activated,
    /// The control never became clickable within the bound.
    Absent,
}

/// An exclusively owned handle on a rendered page.
#[async_trait]
pub trait PageSession: Send {
    /// Load `url` and wait until the document is ready.
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Evaluate a script in the page and return its JSON value
    /// (`Null` when the script produces nothing).
    async fn run_script(&mut self, source: &str) -> Result<serde_json::Value, BrowserError>;

    /// Poll for `locator` until it is clickable, then click it.
    ///
    /// Absence within `timeout` is [`ControlLookup::Absent`], not an error.
    async fn activate(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<ControlLookup, BrowserError>;

    /// Serialized markup of the page as currently rendered.
    async fn current_markup(&mut self) -> Result<String, BrowserError>;

    /// Release the page and the browser. Safe to call more than once.
    async fn close(&mut self);

    /// Scroll the viewport down by `pixels`.
    async fn scroll_by(&mut self, pixels: u32) -> Result<(), BrowserError> {
        self.run_script(&scripts::scroll_by(pixels)).await.map(|_| ())
    }

    /// Number of elements currently matching `selector`.
    async fn count_matches(&mut self, selector: &str) -> Result<usize, BrowserError> {
        let value = self.run_script(&scripts::count_matches(selector)).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_failure_detection() {
        let err = BrowserError::navigation(
            "https://www.google.com",
            "net::ERR_PROXY_CONNECTION_FAILED",
        );
        assert!(err.is_proxy_failure());
        assert!(!BrowserError::Closed.is_proxy_failure());
    }
}
