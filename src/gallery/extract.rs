//! Image location extraction from rendered markup.

use scraper::{Html, Selector};
use url::Url;

use crate::error::{GalleryError, Result};

/// Look images inside the collection gallery.
pub const DEFAULT_GALLERY_SELECTOR: &str = "#gallery-collection > div > div:nth-of-type(1) > div > div > a > figure > span > picture > img";

/// Collect the `src` of every element matching `region_selector`, in document order.
///
/// Every matched element keeps its position. One without a usable `src`
/// yields an empty location, which fails at download time.
pub fn extract(markup: &str, region_selector: &str) -> Result<Vec<String>> {
    let selector = Selector::parse(region_selector).map_err(|e| {
        GalleryError::config(format!(
            "Invalid gallery selector '{}': {:?}",
            region_selector, e
        ))
    })?;

    let document = Html::parse_document(markup);
    let locations = document
        .select(&selector)
        .map(|element| {
            element
                .value()
                .attr("src")
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        })
        .collect();

    Ok(locations)
}

/// Resolve relative locations against the page they were found on.
///
/// Locations that cannot be joined are kept as-is so they fail at download
/// time rather than silently shifting the numbering.
pub fn resolve_locations(page_url: &Url, locations: Vec<String>) -> Vec<String> {
    locations
        .into_iter()
        .map(|location| {
            if location.is_empty() {
                return location;
            }
            match page_url.join(&location) {
                Ok(url) => url.to_string(),
                Err(_) => location,
            }
        })
        .collect()
}
