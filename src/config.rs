//! Configuration management using the prefer crate for discovery.
//!
//! Precedence, lowest first: built-in defaults, the config file, environment
//! variables, then command-line flags (applied by the CLI).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::browser::{BrowserEngineConfig, Locator};
use crate::download::DownloadConfig;
use crate::error::{GalleryError, Result};
use crate::gallery::{RevealOptions, DEFAULT_BASE_URL, DEFAULT_GALLERY_SELECTOR};
use crate::proxy::ConnectivityCheck;

/// Name used for config file discovery (`runway-gallery.toml`, ...).
pub const CONFIG_NAME: &str = "runway-gallery";

/// Persistent bottom banner covering the gallery for anonymous visitors.
pub const DEFAULT_OVERLAY_SELECTOR: &str = ".PersistentBottomWrapper-eddooY.bIieWF.persistent-bottom";

/// Elements counted to tell when revealed looks have finished rendering.
pub const DEFAULT_SETTLE_SELECTOR: &str = "#gallery-collection img";

pub const DEFAULT_LOAD_MORE_LABEL: &str = "Load More";

/// Default per-image transfer bound in seconds.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 60;

/// Reveal loop tuning as written in the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub scroll_step: Option<u32>,
    pub max_attempts: Option<u32>,
    pub scroll_pause_ms: Option<u64>,
    pub control_timeout_ms: Option<u64>,
    pub load_wait_ms: Option<u64>,
}

/// Config file contents. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory collection folders are created in.
    pub output_dir: Option<String>,
    /// Root of collection pages.
    pub base_url: Option<String>,
    pub gallery_selector: Option<String>,
    pub settle_selector: Option<String>,
    /// Set to an empty string to skip overlay dismissal.
    pub overlay_selector: Option<String>,
    pub load_more_label: Option<String>,
    /// Extension for saved images (without the dot).
    pub extension: Option<String>,
    /// Per-image transfer bound; 0 disables it.
    pub download_timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    /// Run the proxy/internet check after starting the browser.
    pub check_connectivity: Option<bool>,
    pub ip_echo_url: Option<String>,
    pub reachability_url: Option<String>,
    pub reveal: RevealConfig,
    pub browser: Option<BrowserEngineConfig>,
    /// Path the config was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Falls back to an empty config when no file is found or it fails to parse.
    pub async fn load() -> Self {
        match prefer::load(CONFIG_NAME).await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config file: {}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports TOML, YAML and JSON based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            GalleryError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

        let mut config: Config = match ext {
            "json" => serde_json::from_str(&contents)
                .map_err(|e| GalleryError::config(format!("Failed to parse JSON config: {}", e)))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| GalleryError::config(format!("Failed to parse YAML config: {}", e)))?,
            _ => toml::from_str(&contents)
                .map_err(|e| GalleryError::config(format!("Failed to parse TOML config: {}", e)))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Directory relative paths in the file are resolved against.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref output_dir) = self.output_dir {
            settings.output_dir = resolve_path(output_dir, base_dir);
        }
        if let Some(ref base_url) = self.base_url {
            settings.base_url = base_url.clone();
        }
        if let Some(ref selector) = self.gallery_selector {
            settings.gallery_selector = selector.clone();
        }
        if let Some(ref selector) = self.settle_selector {
            settings.settle_selector = non_empty(selector);
        }
        if let Some(ref selector) = self.overlay_selector {
            settings.overlay_selector = non_empty(selector);
        }
        if let Some(ref label) = self.load_more_label {
            settings.load_more_label = label.clone();
        }
        if let Some(ref extension) = self.extension {
            settings.extension = extension.trim_start_matches('.').to_string();
        }
        if let Some(secs) = self.download_timeout_secs {
            settings.download_timeout_secs = (secs > 0).then_some(secs);
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(check) = self.check_connectivity {
            settings.check_connectivity = check;
        }
        if let Some(ref url) = self.ip_echo_url {
            settings.connectivity.ip_echo_url = url.clone();
        }
        if let Some(ref url) = self.reachability_url {
            settings.connectivity.reachability_url = url.clone();
        }

        let reveal = &self.reveal;
        if let Some(v) = reveal.scroll_step {
            settings.scroll_step = v;
        }
        if let Some(v) = reveal.max_attempts {
            settings.max_attempts = v;
        }
        if let Some(v) = reveal.scroll_pause_ms {
            settings.scroll_pause_ms = v;
        }
        if let Some(v) = reveal.control_timeout_ms {
            settings.control_timeout_ms = v;
        }
        if let Some(v) = reveal.load_wait_ms {
            settings.load_wait_ms = v;
        }

        if let Some(ref browser) = self.browser {
            settings.browser = browser.clone();
        }
    }
}

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub base_url: String,
    pub gallery_selector: String,
    pub settle_selector: Option<String>,
    pub overlay_selector: Option<String>,
    pub load_more_label: String,
    pub extension: String,
    pub scroll_step: u32,
    pub max_attempts: u32,
    pub scroll_pause_ms: u64,
    pub control_timeout_ms: u64,
    pub load_wait_ms: u64,
    pub download_timeout_secs: Option<u64>,
    pub user_agent: String,
    pub check_connectivity: bool,
    pub connectivity: ConnectivityCheck,
    pub browser: BrowserEngineConfig,
}

impl Default for Settings {
    fn default() -> Self {
        let reveal = RevealOptions::default();
        Self {
            output_dir: PathBuf::from("."),
            base_url: DEFAULT_BASE_URL.to_string(),
            gallery_selector: DEFAULT_GALLERY_SELECTOR.to_string(),
            settle_selector: Some(DEFAULT_SETTLE_SELECTOR.to_string()),
            overlay_selector: Some(DEFAULT_OVERLAY_SELECTOR.to_string()),
            load_more_label: DEFAULT_LOAD_MORE_LABEL.to_string(),
            extension: "jpg".to_string(),
            scroll_step: reveal.scroll_step,
            max_attempts: reveal.max_attempts,
            scroll_pause_ms: reveal.scroll_pause.as_millis() as u64,
            control_timeout_ms: reveal.control_timeout.as_millis() as u64,
            load_wait_ms: reveal.load_wait.as_millis() as u64,
            download_timeout_secs: Some(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
            user_agent: DownloadConfig::default().user_agent,
            check_connectivity: true,
            connectivity: ConnectivityCheck::default(),
            browser: BrowserEngineConfig::default(),
        }
    }
}

impl Settings {
    /// Apply `RUNWAY_OUTPUT_DIR` and `RUNWAY_BROWSER_URL` from the environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = lookup("RUNWAY_OUTPUT_DIR") {
            tracing::debug!("Using RUNWAY_OUTPUT_DIR from environment: {}", dir);
            self.output_dir = PathBuf::from(shellexpand::tilde(&dir).as_ref());
        }
        if let Some(url) = lookup("RUNWAY_BROWSER_URL") {
            tracing::debug!("Using RUNWAY_BROWSER_URL from environment: {}", url);
            self.browser.remote_url = Some(url);
        }
    }

    pub fn reveal_options(&self) -> RevealOptions {
        RevealOptions {
            scroll_step: self.scroll_step,
            max_attempts: self.max_attempts,
            scroll_pause: Duration::from_millis(self.scroll_pause_ms),
            control: Locator::ButtonText(self.load_more_label.clone()),
            control_timeout: Duration::from_millis(self.control_timeout_ms),
            load_wait: Duration::from_millis(self.load_wait_ms),
            settle_selector: self.settle_selector.clone(),
            ..RevealOptions::default()
        }
    }

    pub fn download_config(&self) -> DownloadConfig {
        DownloadConfig {
            extension: self.extension.clone(),
            item_timeout: self.download_timeout_secs.map(Duration::from_secs),
            proxy: self.browser.proxy.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Options controlling where configuration comes from.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file (skips discovery).
    pub config_path: Option<PathBuf>,
    /// Resolve relative paths from the current directory instead of the
    /// config file's directory.
    pub use_cwd: bool,
}

/// Build settings from defaults, config file and environment.
pub async fn load_settings(options: &LoadOptions) -> Result<Settings> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = if options.use_cwd {
        cwd
    } else {
        config.base_dir().unwrap_or(cwd)
    };

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);
    settings.apply_env_overrides();
    Ok(settings)
}

/// Resolve a path that may be relative to the config file.
/// Paths starting with ~ are expanded.
fn resolve_path(path_str: &str, base_dir: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(path_str);
    let path = Path::new(expanded.as_ref());

    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
