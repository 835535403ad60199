//! runway-gallery - fetch every look of a runway collection.
//!
//! Opens a collection page in a headless browser, keeps scrolling and pressing
//! "Load More" until the whole gallery is on the page, then saves each image
//! as `<brand>_<season>/<n>.jpg` in page order.

pub mod browser;
pub mod config;
pub mod download;
pub mod error;
pub mod gallery;
pub mod pipeline;
pub mod proxy;

pub use browser::{BrowserError, ControlLookup, Locator, PageSession};
pub use download::{DownloadConfig, DownloadEvent, DownloadSummary, Downloader};
pub use error::{GalleryError, Result};
pub use gallery::Collection;
pub use pipeline::{run_collection, run_then_close, RunPlan, RunReport};
