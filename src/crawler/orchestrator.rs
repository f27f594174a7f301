//! Runs one crawl end to end: pages, listings, events, teardown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::browser::{script, Browser, PageContext};
use crate::config::Config;
use crate::crawler::collector::{ListingCollector, ListingPreview};
use crate::crawler::detail::DetailExtractor;
use crate::crawler::events::{CrawlHandle, EventSink};
use crate::crawler::job::{CrawlJob, CrawlRequest, VehicleRecord};
use crate::crawler::navigate::NavigationPolicy;
use crate::crawler::pacing::Pacer;
use crate::extract::{catalog, normalize};
use crate::{CrawlError, Result};

/// Owns the pieces a crawl needs and drives the page loop. Each spawned
/// job gets its own browser session and its own event stream.
#[derive(Clone)]
pub struct CrawlOrchestrator {
    config: Config,
    browser: Arc<dyn Browser>,
    navigation: NavigationPolicy,
    collector: ListingCollector,
    detail: DetailExtractor,
    pacer: Pacer,
}

impl CrawlOrchestrator {
    pub fn new(config: Config, browser: Arc<dyn Browser>) -> Result<Self> {
        let navigation = NavigationPolicy::new(&config.navigation);
        let collector = ListingCollector::new(
            &config.crawl.listing_url_pattern,
            Duration::from_millis(config.extraction.content_wait),
        )?;
        let detail = DetailExtractor::new(&config.extraction);
        let pacer = Pacer::new(config.pacing.clone());
        Ok(Self {
            config,
            browser,
            navigation,
            collector,
            detail,
            pacer,
        })
    }

    /// Validate the request, start the job on the runtime and hand back the
    /// consumer's end of it.
    pub fn spawn(&self, request: CrawlRequest) -> Result<CrawlHandle> {
        let job = CrawlJob::new(&request, &self.config.crawl)?;
        let id = job.id;
        let cancel = job.cancel_token();

        let (tx, rx) = mpsc::channel(self.config.crawl.event_buffer);
        let sink = EventSink::new(tx, cancel.clone());

        let orchestrator = self.clone();
        tokio::spawn(async move { orchestrator.run(job, sink).await });

        Ok(CrawlHandle::new(id, cancel, rx))
    }

    /// Execute the job against a fresh browser session. The session is
    /// closed on every path before the terminal event goes out.
    pub async fn run(&self, mut job: CrawlJob, events: EventSink) {
        let started = Instant::now();
        info!(job = %job.id, "starting crawl of {}", job.base_url());
        events
            .log(format!(
                "crawl started for {} (up to {} pages)",
                job.base_url(),
                job.max_pages
            ))
            .await;

        let page = match self.browser.open().await {
            Ok(page) => page,
            Err(err) => {
                let err = CrawlError::from(err);
                warn!(job = %job.id, "{}", err);
                events.error(err.to_string()).await;
                return;
            }
        };

        let outcome = self.drive(&mut job, page.as_ref(), &events).await;

        // The session must be gone before the terminal event goes out
        if let Err(err) = page.close().await {
            warn!(job = %job.id, "closing the browser session failed: {}", err);
        }

        match outcome {
            Ok(()) => {
                if job.is_cancelled() {
                    events
                        .log("crawl cancelled; keeping everything collected so far")
                        .await;
                }
                let summary = job.summary(started.elapsed());
                info!(job = %job.id, "{}", summary);
                events.log(summary).await;
                events.complete().await;
            }
            Err(err) => {
                warn!(job = %job.id, "crawl failed: {}", err);
                events.error(err.to_string()).await;
            }
        }
    }

    /// The page loop. Fatal errors bubble up; everything narrower is
    /// handled where it happens and at most ends the pagination early.
    async fn drive(
        &self,
        job: &mut CrawlJob,
        page: &dyn PageContext,
        events: &EventSink,
    ) -> Result<()> {
        let mut consent_pending = true;

        while job.current_page <= job.max_pages && job.has_more && !job.is_cancelled() {
            let page_url = job.page_url(job.current_page);
            events
                .log(format!(
                    "loading results page {} of {}",
                    job.current_page, job.max_pages
                ))
                .await;
            self.navigation
                .goto(page, page_url.as_str())
                .await
                .map_err(|source| CrawlError::SearchPage {
                    page: job.current_page,
                    source,
                })?;
            job.stats.pages_visited += 1;

            if self.results_exhausted(page, job.current_page).await? {
                job.has_more = false;
                events
                    .log(format!(
                        "page {} reports zero offers; stopping",
                        job.current_page
                    ))
                    .await;
            } else {
                if consent_pending {
                    self.dismiss_consent(page).await;
                    consent_pending = false;
                }

                let previews = self.collector.collect(page, &page_url).await;
                if previews.is_empty() {
                    job.has_more = false;
                    events
                        .log(format!(
                            "no listings found on page {}; stopping",
                            job.current_page
                        ))
                        .await;
                } else {
                    events
                        .log(format!(
                            "found {} listings on page {}",
                            previews.len(),
                            job.current_page
                        ))
                        .await;
                    for preview in previews {
                        if job.is_cancelled() {
                            break;
                        }
                        let record = self.process_listing(page, preview, job.current_page).await;
                        if !record.note.is_empty() {
                            job.stats.failed_detail_navigations += 1;
                        }
                        job.stats.listings_processed += 1;
                        job.push(record);
                        events.snapshot(job.vehicles.clone()).await;
                        if job.is_cancelled() {
                            break;
                        }
                        self.pacer.pause_between_listings().await;
                    }
                }
            }

            events.progress(job.progress_percent()).await;

            if job.has_more {
                job.current_page += 1;
                if job.current_page <= job.max_pages && !job.is_cancelled() {
                    self.pacer.pause_between_pages().await;
                }
            }
        }

        Ok(())
    }

    /// The site announces an empty result set in the page body, in any of
    /// its languages.
    async fn results_exhausted(&self, page: &dyn PageContext, page_no: u32) -> Result<bool> {
        let body = script::body_text(page)
            .await
            .map_err(|source| CrawlError::PageInspection {
                page: page_no,
                source,
            })?;
        let body = body.to_lowercase();
        Ok(self
            .config
            .crawl
            .zero_result_markers
            .iter()
            .any(|marker| body.contains(&marker.to_lowercase())))
    }

    /// Best effort only; a missing banner or a failed click never stops
    /// the crawl.
    async fn dismiss_consent(&self, page: &dyn PageContext) {
        let wait = Duration::from_millis(self.config.extraction.consent_wait);
        for group in &catalog::consent_buttons() {
            let union = group.css_union();
            match page.wait_for_selector(&union, wait).await {
                Ok(true) => {
                    match page.click(&union).await {
                        Ok(()) => {
                            debug!("dismissed the cookie banner via '{}' buttons", group.label)
                        }
                        Err(err) => debug!("clicking the cookie banner failed: {}", err),
                    }
                    return;
                }
                Ok(false) => continue,
                Err(err) => {
                    debug!("cookie banner probe failed: {}", err);
                    return;
                }
            }
        }
        debug!("no cookie banner found");
    }

    /// Visit one listing and build its record. A listing page that will not
    /// load keeps its preview data and gets a note instead of killing the
    /// crawl.
    async fn process_listing(
        &self,
        page: &dyn PageContext,
        preview: ListingPreview,
        page_no: u32,
    ) -> VehicleRecord {
        let mut record = VehicleRecord::new(preview.url.clone(), page_no);
        record.title = preview.title;
        record.price = preview.price;
        record.mileage = preview.mileage;
        record.year = preview.year;

        match self.navigation.goto(page, &preview.url).await {
            Ok(_) => {
                let fields = self.detail.extract(page, &preview.url).await;
                record.apply_detail(fields);
            }
            Err(err) => {
                warn!("listing page {} could not be loaded: {}", preview.url, err);
                record.note = "navigation impossible".to_string();
            }
        }

        record.derive_make_and_model();
        record.price = normalize::clean_price(&record.price);
        record.phone =
            normalize::canonical_phone(&record.phone, &self.config.extraction.phone_country_prefix);
        record
    }
}
