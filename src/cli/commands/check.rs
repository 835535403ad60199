//! `check`: start the browser and confirm it can reach the internet.

use console::style;
use runway_gallery::browser::PageSession;
use runway_gallery::config::Settings;

use crate::cli::prompts::Prompter;
use crate::cli::BrowserArgs;

use super::{open_session, resolve_proxy};

/// Start the browser, run the connectivity check and shut down.
///
/// The check always runs here, whatever the config file says.
pub async fn cmd_check(mut settings: Settings, args: &BrowserArgs) -> anyhow::Result<()> {
    let mut prompter = Prompter::stdio();
    let prompter = console::user_attended().then_some(&mut prompter);
    resolve_proxy(&mut settings, args, prompter)?;

    settings.check_connectivity = true;
    let mut session = open_session(&settings).await?;
    session.close().await;

    println!("{} Browser session OK", style("✓").green());
    Ok(())
}
