//! Command implementations.

mod check;
mod fetch;

pub use check::cmd_check;
pub use fetch::cmd_fetch;

use std::io::{BufRead, Write};

use console::style;
use runway_gallery::browser::{ChromeSession, PageSession};
use runway_gallery::config::Settings;
use runway_gallery::proxy::{check_connectivity, env_proxy};
use runway_gallery::GalleryError;

use crate::cli::prompts::Prompter;
use crate::cli::BrowserArgs;

/// Fill in the proxy when neither flags nor config chose one.
///
/// Interactive sessions confirm the environment proxy or enter one by hand;
/// otherwise the environment value is used as is.
fn resolve_proxy<R: BufRead, W: Write>(
    settings: &mut Settings,
    args: &BrowserArgs,
    prompter: Option<&mut Prompter<R, W>>,
) -> std::io::Result<()> {
    if args.no_proxy || settings.browser.proxy.is_some() {
        return Ok(());
    }

    settings.browser.proxy = match prompter {
        Some(prompter) => prompter.choose_proxy(env_proxy())?,
        None => env_proxy(),
    };
    Ok(())
}

/// Start the browser and, unless disabled, confirm it can reach the internet.
///
/// Any failure here is fatal; the session is closed before returning it.
async fn open_session(settings: &Settings) -> Result<ChromeSession, GalleryError> {
    let mut session = ChromeSession::launch(&settings.browser)
        .await
        .map_err(GalleryError::SessionInit)?;

    if !settings.check_connectivity {
        return Ok(session);
    }

    let proxied = settings.browser.proxy.is_some();
    match check_connectivity(&mut session, &settings.connectivity, proxied).await {
        Ok(Some(ip)) => {
            println!(
                "{} Proxy connection successful. Public IP: {}",
                style("✓").green(),
                ip
            );
            println!("{} Internet connection test successful", style("✓").green());
            Ok(session)
        }
        Ok(None) => {
            println!("{} Internet connection test successful", style("✓").green());
            Ok(session)
        }
        Err(e) => {
            session.close().await;
            eprintln!("{} Connection failed: {}", style("✗").red(), e);
            if e.is_proxy_failure() {
                eprintln!(
                    "  {} check the proxy address and port, that the proxy is running, and that no VPN is interfering",
                    style("hint:").yellow()
                );
            }
            Err(GalleryError::SessionInit(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_configured_proxy_is_not_prompted() {
        let mut settings = Settings::default();
        settings.browser.proxy = Some("http://10.0.0.2:3128".to_string());

        let mut prompter = Prompter::new(Cursor::new(Vec::<u8>::new()), Vec::<u8>::new());
        resolve_proxy(&mut settings, &BrowserArgs::default(), Some(&mut prompter)).unwrap();
        assert_eq!(settings.browser.proxy.as_deref(), Some("http://10.0.0.2:3128"));
    }

    #[test]
    fn test_no_proxy_skips_prompt() {
        let mut settings = Settings::default();
        let args = BrowserArgs {
            no_proxy: true,
            ..Default::default()
        };

        let mut prompter = Prompter::new(Cursor::new(b"192.168.1.1\n80\n".to_vec()), Vec::<u8>::new());
        resolve_proxy(&mut settings, &args, Some(&mut prompter)).unwrap();
        assert_eq!(settings.browser.proxy, None);
    }
}
