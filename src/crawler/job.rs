//! Crawl job state: the record being built, the page cursor and the
//! termination conditions.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use crate::config::CrawlSettings;
use crate::crawler::detail::DetailFields;
use crate::{CrawlError, Result};

/// What the caller asks for: a search URL and whether to walk past page one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlRequest {
    /// Search-results URL to start from
    pub search_url: String,
    /// Follow pagination up to the configured page budget
    pub multi_page: bool,
}

/// One collected vehicle. Preview fields come from the results page, the
/// rest from the listing's own page; absent values stay empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub url: String,
    pub title: String,
    pub brand: String,
    pub model: String,
    pub price: String,
    pub year: String,
    pub mileage: String,
    pub fuel_type: String,
    pub transmission: String,
    pub power: String,
    pub location: String,
    pub image_url: String,
    pub phone: String,
    pub seller: String,
    /// Results page the listing was found on (1-based)
    pub page: u32,
    /// Non-fatal trouble encountered while collecting this record
    pub note: String,
    /// When the record was collected
    pub extracted_at: DateTime<Utc>,
}

impl VehicleRecord {
    pub fn new(url: impl Into<String>, page: u32) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            brand: String::new(),
            model: String::new(),
            price: String::new(),
            year: String::new(),
            mileage: String::new(),
            fuel_type: String::new(),
            transmission: String::new(),
            power: String::new(),
            location: String::new(),
            image_url: String::new(),
            phone: String::new(),
            seller: String::new(),
            page,
            note: String::new(),
            extracted_at: Utc::now(),
        }
    }

    /// Fill brand and model from the title's leading words when they are
    /// still empty ("BMW 318d Touring" gives brand "BMW", model "318d").
    pub fn derive_make_and_model(&mut self) {
        let mut words = self.title.split_whitespace();
        if let Some(first) = words.next() {
            if self.brand.is_empty() {
                self.brand = first.to_string();
            }
        }
        if let Some(second) = words.next() {
            if self.model.is_empty() {
                self.model = second.to_string();
            }
        }
    }

    /// Overlay fields read from the listing's own page; a non-empty detail
    /// value beats whatever the results-page preview supplied.
    pub fn apply_detail(&mut self, detail: DetailFields) {
        fn overlay(slot: &mut String, value: String) {
            if !value.is_empty() {
                *slot = value;
            }
        }
        overlay(&mut self.title, detail.title);
        overlay(&mut self.price, detail.price);
        overlay(&mut self.mileage, detail.mileage);
        overlay(&mut self.transmission, detail.transmission);
        overlay(&mut self.year, detail.year);
        overlay(&mut self.fuel_type, detail.fuel_type);
        overlay(&mut self.power, detail.power);
        overlay(&mut self.location, detail.location);
        overlay(&mut self.seller, detail.seller);
        overlay(&mut self.image_url, detail.image_url);
        overlay(&mut self.phone, detail.phone);
    }
}

/// Counters reported in the end-of-run summary.
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub pages_visited: u32,
    pub listings_processed: u32,
    pub failed_detail_navigations: u32,
}

/// Mutable state of one crawl run.
#[derive(Debug)]
pub struct CrawlJob {
    pub id: Uuid,
    base_url: Url,
    page_param: String,
    pub max_pages: u32,
    pub current_page: u32,
    pub has_more: bool,
    pub vehicles: Vec<VehicleRecord>,
    pub stats: RunStats,
    cancel: CancellationToken,
}

impl CrawlJob {
    pub fn new(request: &CrawlRequest, settings: &CrawlSettings) -> Result<Self> {
        let mut base_url =
            Url::parse(&request.search_url).map_err(|source| CrawlError::InvalidSearchUrl {
                url: request.search_url.clone(),
                source,
            })?;
        strip_page_param(&mut base_url, &settings.page_param);

        let max_pages = if request.multi_page {
            settings.max_pages.max(1)
        } else {
            1
        };

        Ok(Self {
            id: Uuid::new_v4(),
            base_url,
            page_param: settings.page_param.clone(),
            max_pages,
            current_page: 1,
            has_more: true,
            vehicles: Vec::new(),
            stats: RunStats::default(),
            cancel: CancellationToken::new(),
        })
    }

    /// Search URL for the given page, with the page parameter appended to
    /// the caller's original query.
    pub fn page_url(&self, page: u32) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair(&self.page_param, &page.to_string());
        url
    }

    /// Rounded percentage of the page budget covered by the current page,
    /// capped at 100.
    pub fn progress_percent(&self) -> u8 {
        if self.max_pages == 0 {
            return 100;
        }
        let ratio = f64::from(self.current_page) / f64::from(self.max_pages);
        (ratio * 100.0).round().min(100.0) as u8
    }

    pub fn push(&mut self, record: VehicleRecord) {
        self.vehicles.push(record);
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// One-line account of the finished run
    pub fn summary(&self, elapsed: Duration) -> String {
        format!(
            "collected {} vehicles from {} pages ({} listings processed, {} detail navigations failed) in {:.1}s",
            self.vehicles.len(),
            self.stats.pages_visited,
            self.stats.listings_processed,
            self.stats.failed_detail_navigations,
            elapsed.as_secs_f64()
        )
    }
}

/// Drop any caller-supplied page parameter so the job's own page cursor is
/// the only one on the URL.
fn strip_page_param(url: &mut Url, page_param: &str) {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key.as_ref() != page_param)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.set_query(None);
    if !kept.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &kept {
            pairs.append_pair(key, value);
        }
    }
}
