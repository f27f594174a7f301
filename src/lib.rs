//! Polite crawler engine for vehicle classifieds: walks a search's result
//! pages, visits every listing, extracts the advertised details through
//! selector cascades and reports everything over an event stream.

pub mod browser;
pub mod cli;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod utils;

use thiserror::Error;

use crate::browser::BrowserError;

/// Errors that kill a crawl job. Anything narrower (a missing field, an
/// unreachable listing page) is absorbed where it happens.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("'{url}' is not a valid search URL: {source}")]
    InvalidSearchUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("'{pattern}' is not a valid listing URL pattern: {source}")]
    InvalidListingPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("could not open a browser session: {0}")]
    Session(#[from] BrowserError),

    #[error("results page {page} could not be loaded: {source}")]
    SearchPage { page: u32, source: BrowserError },

    #[error("results page {page} could not be inspected: {source}")]
    PageInspection { page: u32, source: BrowserError },
}

pub type Result<T> = std::result::Result<T, CrawlError>;

// Re-export the public surface
pub use browser::{Browser, PageContext, WaitUntil, WebDriverBrowser};
pub use config::Config;
pub use crawler::{
    CrawlEvent, CrawlHandle, CrawlJob, CrawlOrchestrator, CrawlRequest, VehicleRecord,
};
