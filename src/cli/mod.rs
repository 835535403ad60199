//! Command-line interface.

mod commands;
mod progress;
mod prompts;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use console::style;

use runway_gallery::config::{load_settings, LoadOptions, Settings};
use runway_gallery::GalleryError;

#[derive(Parser)]
#[command(name = "runway-gallery")]
#[command(about = "Download every look of a runway collection")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Download a collection (prompts for anything not given)
    Fetch(FetchArgs),

    /// Start the browser and check proxy and internet connectivity
    Check(BrowserArgs),
}

/// Browser options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct BrowserArgs {
    /// Proxy server URL (e.g. http://192.168.1.100:8080)
    #[arg(long)]
    pub proxy: Option<String>,

    /// Do not use a proxy, even one from the environment
    #[arg(long, conflicts_with = "proxy")]
    pub no_proxy: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Connect to a running Chrome (e.g. ws://localhost:9222) instead of launching one
    #[arg(long)]
    pub browser_url: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FetchArgs {
    /// Designer or brand name (e.g. "Yohji Yamamoto")
    #[arg(short, long)]
    pub brand: Option<String>,

    /// Season name (e.g. "Fall 2024 Ready-to-Wear")
    #[arg(short, long)]
    pub season: Option<String>,

    /// Load every look before downloading
    #[arg(short, long, conflicts_with = "no_all")]
    pub all: bool,

    /// Only download the looks shown on first load
    #[arg(long)]
    pub no_all: bool,

    /// Directory the collection folder is created in
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum scroll and Load More attempts without finding the control
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Pixels scrolled per attempt
    #[arg(long)]
    pub scroll_step: Option<u32>,

    /// Skip the proxy and internet connectivity check
    #[arg(long)]
    pub no_proxy_check: bool,

    #[command(flatten)]
    pub browser: BrowserArgs,
}

impl FetchArgs {
    /// `None` when neither `--all` nor `--no-all` was given.
    pub fn load_all(&self) -> Option<bool> {
        match (self.all, self.no_all) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref output) = self.output {
            settings.output_dir = output.clone();
        }
        if let Some(max_attempts) = self.max_attempts {
            settings.max_attempts = max_attempts;
        }
        if let Some(scroll_step) = self.scroll_step {
            settings.scroll_step = scroll_step;
        }
        if self.no_proxy_check {
            settings.check_connectivity = false;
        }
        self.browser.apply_to_settings(settings);
    }
}

impl BrowserArgs {
    fn apply_to_settings(&self, settings: &mut Settings) {
        if self.headed {
            settings.browser.headless = false;
        }
        if let Some(ref url) = self.browser_url {
            settings.browser.remote_url = Some(url.clone());
        }
        if self.no_proxy {
            settings.browser.proxy = None;
        } else if let Some(ref proxy) = self.proxy {
            settings.browser.proxy = Some(proxy.clone());
        }
    }
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
    };
    let mut settings = load_settings(&options)
        .await
        .context("Failed to load configuration")?;

    let result = match cli.command {
        Commands::Fetch(args) => {
            args.apply_to_settings(&mut settings);
            commands::cmd_fetch(settings, &args).await
        }
        Commands::Check(args) => {
            args.apply_to_settings(&mut settings);
            commands::cmd_check(settings, &args).await
        }
    };

    if let Err(ref e) = result {
        if is_session_start_failure(e) {
            eprintln!(
                "{} The browser session could not be started; nothing was downloaded",
                style("✗").red()
            );
        }
    }
    result
}

/// Whether the run stopped before the browser was usable.
fn is_session_start_failure(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<GalleryError>()
        .is_some_and(GalleryError::is_session_init)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use runway_gallery::BrowserError;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_fetch_flags_override_settings() {
        let cli = Cli::parse_from([
            "runway-gallery",
            "fetch",
            "--brand",
            "Yohji Yamamoto",
            "--season",
            "Fall 2024 Ready-to-Wear",
            "--no-all",
            "--output",
            "/tmp/looks",
            "--max-attempts",
            "7",
            "--proxy",
            "http://10.0.0.2:3128",
            "--headed",
        ]);
        let Commands::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.load_all(), Some(false));

        let mut settings = Settings::default();
        args.apply_to_settings(&mut settings);
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/looks"));
        assert_eq!(settings.max_attempts, 7);
        assert_eq!(settings.browser.proxy.as_deref(), Some("http://10.0.0.2:3128"));
        assert!(!settings.browser.headless);
    }

    #[test]
    fn test_load_all_unset_by_default() {
        let cli = Cli::parse_from(["runway-gallery", "fetch"]);
        let Commands::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.load_all(), None);
    }

    #[test]
    fn test_no_proxy_clears_configured_proxy() {
        let mut settings = Settings::default();
        settings.browser.proxy = Some("http://10.0.0.2:3128".to_string());

        let args = BrowserArgs {
            no_proxy: true,
            ..Default::default()
        };
        args.apply_to_settings(&mut settings);
        assert_eq!(settings.browser.proxy, None);
        assert!(settings.check_connectivity);
    }

    #[test]
    fn test_fetch_can_skip_connectivity_check() {
        let cli = Cli::parse_from(["runway-gallery", "fetch", "--no-proxy-check"]);
        let Commands::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        let mut settings = Settings::default();
        args.apply_to_settings(&mut settings);
        assert!(!settings.check_connectivity);
    }

    #[test]
    fn test_check_rejects_no_proxy_check() {
        let result = Cli::try_parse_from(["runway-gallery", "check", "--no-proxy-check"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_session_start_failure_detection() {
        let err = anyhow::Error::from(GalleryError::SessionInit(BrowserError::ChromeNotFound));
        assert!(is_session_start_failure(&err));

        let err = anyhow::Error::from(GalleryError::from(BrowserError::Closed));
        assert!(!is_session_start_failure(&err));

        let err = anyhow::anyhow!("Failed to build HTTP client");
        assert!(!is_session_start_failure(&err));
    }
}
