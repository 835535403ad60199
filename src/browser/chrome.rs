//! Chrome-backed page session over the DevTools protocol.

#[cfg(feature = "browser")]
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(feature = "browser")]
use tokio::task::JoinHandle;
#[cfg(feature = "browser")]
use tokio::time::Instant;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Handler, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;

#[cfg(feature = "browser")]
use super::scripts;
use super::{BrowserEngineConfig, BrowserError, ControlLookup, Locator, PageSession};

/// Interval between condition checks while waiting on the page.
#[cfg(feature = "browser")]
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// A single Chrome tab plus the browser that owns it.
///
/// Dropping the session kills a locally launched browser; call
/// [`PageSession::close`] to shut it down cleanly.
#[cfg(feature = "browser")]
pub struct ChromeSession {
    browser: Browser,
    page: Option<Page>,
    handler: JoinHandle<()>,
    timeout: Duration,
    owns_process: bool,
}

#[cfg(feature = "browser")]
impl ChromeSession {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    const CHROME_COMMANDS: &'static [&'static str] = &[
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ];

    /// Launch (or connect to) a browser and open a blank tab.
    pub async fn launch(config: &BrowserEngineConfig) -> Result<Self, BrowserError> {
        let (browser, handler, owns_process) = match config.remote_url.as_deref() {
            Some(remote_url) => {
                let (browser, handler) = Self::connect_remote(remote_url).await?;
                (browser, handler, false)
            }
            None => {
                let (browser, handler) = Self::launch_local(config).await?;
                (browser, handler, true)
            }
        };
        let handler = spawn_handler(handler);

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(BrowserError::Launch(format!("Failed to open tab: {}", e)));
            }
        };

        if let Some(ref user_agent) = config.user_agent {
            if let Err(e) = page
                .execute(SetUserAgentOverrideParams::new(user_agent.clone()))
                .await
            {
                warn!("Failed to override user agent: {}", e);
            }
        }

        Ok(Self {
            browser,
            page: Some(page),
            handler,
            timeout: Duration::from_secs(config.timeout),
            owns_process,
        })
    }

    /// Find Chrome executable.
    fn find_chrome() -> Result<PathBuf, BrowserError> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in Self::CHROME_COMMANDS {
            if let Ok(path) = which::which(cmd) {
                info!("Found Chrome in PATH: {}", path.display());
                return Ok(path);
            }
        }

        Err(BrowserError::ChromeNotFound)
    }

    async fn launch_local(config: &BrowserEngineConfig) -> Result<(Browser, Handler), BrowserError> {
        info!("Launching browser (headless={})", config.headless);

        let chrome_path = Self::find_chrome()?;
        let mut builder = BrowserConfig::builder().chrome_executable(chrome_path);

        // with_head means NOT headless
        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = config.proxy {
            info!("Using proxy server: {}", proxy);
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--no-sandbox")
            .arg("--disable-gpu");

        for arg in &config.chrome_args {
            builder = builder.arg(arg);
        }

        let browser_config = builder
            .build()
            .map_err(|e| BrowserError::Launch(format!("Failed to build browser config: {}", e)))?;

        Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))
    }

    /// Connect to a remote Chrome instance.
    async fn connect_remote(url: &str) -> Result<(Browser, Handler), BrowserError> {
        info!("Connecting to remote browser at {}", url);

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await
            .map_err(|e| BrowserError::Connect(e.to_string()))?
            .json()
            .await
            .map_err(|e| BrowserError::Connect(format!("Bad version info: {}", e)))?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| BrowserError::Connect("No webSocketDebuggerUrl in response".into()))?;

        info!("Connecting to WebSocket: {}", ws_url);

        Browser::connect(ws_url)
            .await
            .map_err(|e| BrowserError::Connect(e.to_string()))
    }

    /// Cloned handle on the open tab.
    fn page(&self) -> Result<Page, BrowserError> {
        self.page.clone().ok_or(BrowserError::Closed)
    }
}

#[cfg(feature = "browser")]
async fn evaluate(page: &Page, source: &str) -> Result<serde_json::Value, BrowserError> {
    let result = page
        .evaluate(source.to_string())
        .await
        .map_err(|e| BrowserError::Script(e.to_string()))?;
    Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
}

/// Poll `document.readyState` until the page reports `complete`.
#[cfg(feature = "browser")]
async fn wait_until_ready(page: &Page, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    loop {
        match evaluate(page, scripts::ready_state()).await {
            Ok(state) if state.as_str() == Some("complete") => return,
            Ok(state) => debug!("Page ready state: {}", state),
            Err(e) => debug!("Could not check ready state: {}", e),
        }
        if Instant::now() >= deadline {
            warn!("Timeout waiting for page ready state");
            return;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(feature = "browser")]
fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    })
}

#[cfg(feature = "browser")]
#[async_trait]
impl PageSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        info!("Navigating to {}", url);
        let params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|e| BrowserError::navigation(url, e))?;

        let page = self.page()?;
        let response = page
            .execute(params)
            .await
            .map_err(|e| BrowserError::navigation(url, e))?;

        if let Some(error) = response.result.error_text.clone() {
            return Err(BrowserError::navigation(url, error));
        }

        wait_until_ready(&page, self.timeout).await;
        Ok(())
    }

    async fn run_script(&mut self, source: &str) -> Result<serde_json::Value, BrowserError> {
        let page = self.page()?;
        evaluate(&page, source).await
    }

    async fn activate(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<ControlLookup, BrowserError> {
        let page = self.page()?;
        let script = scripts::click_if_ready(locator);
        let deadline = Instant::now() + timeout;

        loop {
            let last_error = match evaluate(&page, &script).await {
                Ok(state) if state.as_str() == Some(scripts::CLICKED) => {
                    return Ok(ControlLookup::Activated);
                }
                Ok(_) => None,
                Err(e) => {
                    debug!("Control lookup failed: {}", e);
                    Some(e)
                }
            };

            let now = Instant::now();
            if now >= deadline {
                return match last_error {
                    Some(e) => Err(e),
                    None => Ok(ControlLookup::Absent),
                };
            }
            tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    async fn current_markup(&mut self) -> Result<String, BrowserError> {
        let page = self.page()?;
        page.content()
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))
    }

    async fn close(&mut self) {
        let Some(page) = self.page.take() else {
            return;
        };

        if let Err(e) = page.close().await {
            debug!("Failed to close tab: {}", e);
        }

        // Remote browsers are shared; only shut down what we launched
        if self.owns_process {
            if let Err(e) = self.browser.close().await {
                warn!("Failed to close browser: {}", e);
            }
            if let Err(e) = self.browser.wait().await {
                debug!("Failed to wait for browser exit: {}", e);
            }
        }

        self.handler.abort();
        info!("Browser session closed");
    }
}

#[cfg(feature = "browser")]
impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub struct ChromeSession {
    _private: (),
}

#[cfg(not(feature = "browser"))]
impl ChromeSession {
    pub async fn launch(_config: &BrowserEngineConfig) -> Result<Self, BrowserError> {
        Err(BrowserError::Unavailable)
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl PageSession for ChromeSession {
    async fn navigate(&mut self, _url: &str) -> Result<(), BrowserError> {
        Err(BrowserError::Unavailable)
    }

    async fn run_script(&mut self, _source: &str) -> Result<serde_json::Value, BrowserError> {
        Err(BrowserError::Unavailable)
    }

    async fn activate(
        &mut self,
        _locator: &Locator,
        _timeout: Duration,
    ) -> Result<ControlLookup, BrowserError> {
        Err(BrowserError::Unavailable)
    }

    async fn current_markup(&mut self) -> Result<String, BrowserError> {
        Err(BrowserError::Unavailable)
    }

    async fn close(&mut self) {}
}
