//! `fetch`: download every look of one collection.

use std::io::{BufRead, Write};

use anyhow::Context;
use console::style;
use tokio::sync::mpsc;

use runway_gallery::browser::PageSession;
use runway_gallery::config::Settings;
use runway_gallery::{run_then_close, Collection, Downloader, RunPlan};

use crate::cli::progress;
use crate::cli::prompts::Prompter;
use crate::cli::FetchArgs;

use super::{open_session, resolve_proxy};

/// Download one collection.
///
/// The browser is started and checked before the collection is asked for.
pub async fn cmd_fetch(mut settings: Settings, args: &FetchArgs) -> anyhow::Result<()> {
    let mut prompter = Prompter::stdio();

    let interactive = console::user_attended().then_some(&mut prompter);
    resolve_proxy(&mut settings, &args.browser, interactive)?;

    // Invalid proxy URLs fail here, before Chrome starts
    let downloader =
        Downloader::new(settings.download_config()).context("Failed to build HTTP client")?;

    let mut session = open_session(&settings).await?;
    let (collection, load_all) = collection_or_close(&mut session, args, &mut prompter).await?;

    let plan = RunPlan {
        collection,
        base_url: settings.base_url.clone(),
        gallery_selector: settings.gallery_selector.clone(),
        overlay_selector: settings.overlay_selector.clone(),
        output_root: settings.output_dir.clone(),
        load_all,
        reveal: settings.reveal_options(),
    };

    let (event_tx, event_rx) = mpsc::channel(64);
    let ui = progress::spawn(event_rx);
    let result = run_then_close(&mut session, &plan, &downloader, Some(&event_tx)).await;
    drop(event_tx);
    let _ = ui.await;

    let report = result?;
    if let Some(ref reveal) = report.reveal {
        if !reveal.content_loaded {
            println!(
                "{} No \"Load More\" control found after {} attempts",
                style("!").yellow(),
                reveal.attempts
            );
        }
    }

    println!("Found {} images", style(report.found).cyan());
    let downloads = &report.downloads;
    let mark = if downloads.failed_count() == 0 {
        style("✓").green()
    } else {
        style("!").yellow()
    };
    println!(
        "{} Downloaded {} of {} images to {}",
        mark,
        downloads.saved_count(),
        downloads.total(),
        report.destination.display()
    );
    Ok(())
}

/// Ask for the collection on an open session, closing it if that fails.
async fn collection_or_close<S, R, W>(
    session: &mut S,
    args: &FetchArgs,
    prompter: &mut Prompter<R, W>,
) -> anyhow::Result<(Collection, bool)>
where
    S: PageSession + ?Sized,
    R: BufRead,
    W: Write,
{
    match ask_collection(args, prompter) {
        Ok(answers) => Ok(answers),
        Err(e) => {
            session.close().await;
            Err(e)
        }
    }
}

/// Collection and "load all" choice from flags, asking for whatever is missing.
fn ask_collection<R: BufRead, W: Write>(
    args: &FetchArgs,
    prompter: &mut Prompter<R, W>,
) -> anyhow::Result<(Collection, bool)> {
    if args.season.is_none() || args.brand.is_none() {
        prompter.say("\nCollection Information")?;
    }
    let season = match args.season {
        Some(ref season) => season.clone(),
        None => prompter.ask_required("Enter season name (e.g. Fall 2024 Ready-to-Wear)")?,
    };
    let brand = match args.brand {
        Some(ref brand) => brand.clone(),
        None => prompter.ask_required("Enter designer/brand name (e.g. Yohji Yamamoto)")?,
    };
    let load_all = match args.load_all() {
        Some(load_all) => load_all,
        None => prompter.confirm("\nLoad all images?")?,
    };

    Ok((Collection::new(&brand, &season)?, load_all))
}
