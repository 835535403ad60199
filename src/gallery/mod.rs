//! Runway collections: identity, content reveal and image discovery.

mod extract;
mod reveal;

pub use extract::{extract, resolve_locations, DEFAULT_GALLERY_SELECTOR};
pub use reveal::{reveal, RevealOptions, RevealState};

use url::Url;

use crate::error::{GalleryError, Result};

/// Default root for collection pages.
pub const DEFAULT_BASE_URL: &str = "https://www.vogue.com/fashion-shows";

/// A designer's show for one season, e.g. Yohji Yamamoto, Fall 2024 Ready-to-Wear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub brand: String,
    pub season: String,
}

impl Collection {
    pub fn new(brand: &str, season: &str) -> Result<Self> {
        let brand = brand.trim();
        let season = season.trim();
        if brand.is_empty() {
            return Err(GalleryError::config("brand name is required"));
        }
        if season.is_empty() {
            return Err(GalleryError::config("season name is required"));
        }
        Ok(Self {
            brand: brand.to_string(),
            season: season.to_string(),
        })
    }

    pub fn brand_slug(&self) -> String {
        slugify(&self.brand)
    }

    pub fn season_slug(&self) -> String {
        slugify(&self.season)
    }

    /// Page listing the collection's looks: `<base>/<season>/<brand>`.
    pub fn url(&self, base_url: &str) -> Result<Url> {
        let url = format!(
            "{}/{}/{}",
            base_url.trim_end_matches('/'),
            self.season_slug(),
            self.brand_slug()
        );
        Ok(Url::parse(&url)?)
    }

    /// Directory name for the collection's images: `<brand>_<season>`.
    pub fn destination_name(&self) -> String {
        format!("{}_{}", self.brand_slug(), self.season_slug())
    }
}

/// Lowercase `value` and join its words with `-`.
pub fn slugify(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Fall 2024 Ready-to-Wear"), "fall-2024-ready-to-wear");
        assert_eq!(slugify("  Yohji   Yamamoto "), "yohji-yamamoto");
        assert_eq!(slugify("Dior"), "dior");
    }

    #[test]
    fn test_collection_url() {
        let collection = Collection::new("Yohji Yamamoto", "Fall 2024 Ready-to-Wear").unwrap();
        let url = collection.url(DEFAULT_BASE_URL).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.vogue.com/fashion-shows/fall-2024-ready-to-wear/yohji-yamamoto"
        );

        let url = collection.url("http://localhost:8080/shows/").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/shows/fall-2024-ready-to-wear/yohji-yamamoto"
        );
    }

    #[test]
    fn test_destination_name() {
        let collection = Collection::new("Yohji Yamamoto", "Fall 2024 Ready-to-Wear").unwrap();
        assert_eq!(
            collection.destination_name(),
            "yohji-yamamoto_fall-2024-ready-to-wear"
        );
    }

    #[test]
    fn test_empty_names_rejected() {
        assert!(Collection::new("  ", "Spring 2025").is_err());
        assert!(Collection::new("Prada", "").is_err());
    }
}
