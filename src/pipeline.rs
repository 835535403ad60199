//! End-to-end collection run: navigate, reveal, extract, download.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::{scripts, PageSession};
use crate::download::{ensure_destination, DownloadEvent, DownloadSummary, Downloader};
use crate::error::Result;
use crate::gallery::{extract, resolve_locations, reveal, Collection, RevealOptions, RevealState};

/// Everything needed to fetch one collection.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub collection: Collection,
    pub base_url: String,
    pub gallery_selector: String,
    /// Element hidden after navigation (paywall banner).
    pub overlay_selector: Option<String>,
    /// Directory the collection folder is created in.
    pub output_root: PathBuf,
    /// Drive the page to its full content before extracting.
    pub load_all: bool,
    pub reveal: RevealOptions,
}

/// What a run found and saved.
#[derive(Debug)]
pub struct RunReport {
    pub collection_url: Url,
    /// `None` when full loading was not requested.
    pub reveal: Option<RevealState>,
    pub found: usize,
    pub destination: PathBuf,
    pub downloads: DownloadSummary,
}

/// Fetch a collection using an open session.
///
/// Only navigation, markup and filesystem failures abort the run; reveal
/// give-ups and individual image failures are reflected in the report.
pub async fn run_collection<S>(
    session: &mut S,
    plan: &RunPlan,
    downloader: &Downloader,
    event_tx: Option<&mpsc::Sender<DownloadEvent>>,
) -> Result<RunReport>
where
    S: PageSession + ?Sized,
{
    let collection_url = plan.collection.url(&plan.base_url)?;
    session.navigate(collection_url.as_str()).await?;
    info!("Collection URL: {}", collection_url);

    if let Some(ref selector) = plan.overlay_selector {
        dismiss_overlay(session, selector).await;
    }

    let reveal_state = if plan.load_all {
        Some(reveal(session, &plan.reveal).await)
    } else {
        None
    };

    let markup = session.current_markup().await?;
    let locations = resolve_locations(
        &collection_url,
        extract(&markup, &plan.gallery_selector)?,
    );
    info!("Found {} images to download", locations.len());

    let destination = ensure_destination(&plan.output_root, &plan.collection.destination_name())?;
    let downloads = downloader
        .fetch_all(&locations, &destination, event_tx)
        .await;

    Ok(RunReport {
        collection_url,
        reveal: reveal_state,
        found: locations.len(),
        destination,
        downloads,
    })
}

/// [`run_collection`], then close the session whatever the outcome.
pub async fn run_then_close<S>(
    session: &mut S,
    plan: &RunPlan,
    downloader: &Downloader,
    event_tx: Option<&mpsc::Sender<DownloadEvent>>,
) -> Result<RunReport>
where
    S: PageSession + ?Sized,
{
    let result = run_collection(session, plan, downloader, event_tx).await;
    session.close().await;
    result
}

async fn dismiss_overlay<S>(session: &mut S, selector: &str)
where
    S: PageSession + ?Sized,
{
    match session.run_script(&scripts::hide_element(selector)).await {
        Ok(serde_json::Value::Bool(true)) => info!("Paywall overlay hidden"),
        Ok(_) => debug!("No overlay matching {}", selector),
        Err(e) => warn!("Failed to hide overlay: {}", e),
    }
}
