//! Collects listing links (and preview data) from a results page.

use std::collections::HashSet;
use std::time::Duration;

use regex::Regex;
use tracing::debug;
use url::Url;

use crate::browser::{script, PageContext};
use crate::extract::catalog;
use crate::{CrawlError, Result};

/// What the results page knows about one listing before its own page is
/// visited.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPreview {
    pub url: String,
    pub title: String,
    pub price: String,
    pub mileage: String,
    pub year: String,
}

impl ListingPreview {
    fn bare(url: String) -> Self {
        Self {
            url,
            title: String::new(),
            price: String::new(),
            mileage: String::new(),
            year: String::new(),
        }
    }
}

/// Finds listings by card markup first and by link shape as a last resort.
#[derive(Clone)]
pub struct ListingCollector {
    url_pattern: Regex,
    content_wait: Duration,
}

impl ListingCollector {
    pub fn new(pattern: &str, content_wait: Duration) -> Result<Self> {
        let url_pattern = Regex::new(pattern).map_err(|source| CrawlError::InvalidListingPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            url_pattern,
            content_wait,
        })
    }

    /// All listing previews on the current page, deduplicated, in document
    /// order. An empty result means the page really has no listings the
    /// collector can recognize.
    pub async fn collect(&self, page: &dyn PageContext, page_url: &Url) -> Vec<ListingPreview> {
        let card_groups = catalog::listing_cards();
        if let Some(first) = card_groups.first() {
            match page
                .wait_for_selector(&first.css_union(), self.content_wait)
                .await
            {
                Ok(true) => {}
                Ok(false) => debug!("listing cards did not appear within the content wait"),
                Err(err) => debug!("waiting for listing cards failed: {}", err),
            }
        }

        let probe = catalog::card_probe();
        for group in &card_groups {
            match script::query_cards(page, &group.css_union(), &probe).await {
                Ok(cards) if !cards.is_empty() => {
                    let previews = self.assemble(page_url, cards);
                    if !previews.is_empty() {
                        debug!(
                            "collected {} listings from '{}' cards",
                            previews.len(),
                            group.label
                        );
                        return previews;
                    }
                }
                Ok(_) => debug!("no '{}' cards on this page", group.label),
                Err(err) => debug!("probing '{}' cards failed: {}", group.label, err),
            }
        }

        self.collect_by_link_shape(page, page_url).await
    }

    fn assemble(&self, page_url: &Url, cards: Vec<script::RawCard>) -> Vec<ListingPreview> {
        let mut seen = HashSet::new();
        let mut previews = Vec::new();
        for card in cards {
            let Some(url) = absolutize(page_url, &card.href) else {
                continue;
            };
            if !seen.insert(url.clone()) {
                continue;
            }
            previews.push(ListingPreview {
                url,
                title: card.title.trim().to_string(),
                price: card.price.trim().to_string(),
                mileage: card.mileage.trim().to_string(),
                year: card.year.trim().to_string(),
            });
        }
        previews
    }

    /// Card markup changed under us: fall back to scanning every anchor on
    /// the page for hrefs shaped like a listing URL.
    async fn collect_by_link_shape(
        &self,
        page: &dyn PageContext,
        page_url: &Url,
    ) -> Vec<ListingPreview> {
        let hrefs = match script::query_attrs(page, "a[href]", "href").await {
            Ok(hrefs) => hrefs,
            Err(err) => {
                debug!("link-shape fallback failed: {}", err);
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let mut previews = Vec::new();
        for href in hrefs {
            let Some(url) = absolutize(page_url, &href) else {
                continue;
            };
            if !self.url_pattern.is_match(&url) {
                continue;
            }
            if !seen.insert(url.clone()) {
                continue;
            }
            previews.push(ListingPreview::bare(url));
        }
        debug!("link-shape fallback found {} listings", previews.len());
        previews
    }
}

fn absolutize(page_url: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    page_url.join(href).ok().map(|url| url.to_string())
}
