//! In-memory browser double for end-to-end crawl tests. Pages are scripted
//! by substring: the first registered response whose pattern occurs in the
//! evaluated script is returned.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use lotcrawler::browser::{Browser, BrowserError, PageContext, WaitUntil};
use lotcrawler::config::Config;
use lotcrawler::crawler::{CrawlEvent, CrawlHandle};

/// Scripted behavior of one URL.
#[derive(Debug, Default, Clone)]
pub struct PageScript {
    body_text: String,
    responses: Vec<(String, Value)>,
}

impl PageScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body_text(mut self, text: &str) -> Self {
        self.body_text = text.to_string();
        self
    }

    /// Answer any evaluated script containing `script_part` with `value`
    pub fn respond(mut self, script_part: &str, value: Value) -> Self {
        self.responses.push((script_part.to_string(), value));
        self
    }
}

#[derive(Debug)]
struct NavFailure {
    url_part: String,
    condition: Option<WaitUntil>,
    remaining: usize,
}

#[derive(Debug, Default)]
struct SiteState {
    pages: HashMap<String, PageScript>,
    nav_failures: Vec<NavFailure>,
    navigations: Vec<(String, WaitUntil)>,
    clicks: Vec<String>,
    current_url: String,
    closed: bool,
    fail_open: bool,
}

/// Browser double backed by shared state, so a test can keep a handle on it
/// after the orchestrator takes its own.
#[derive(Clone, Default)]
pub struct FakeBrowser {
    state: Arc<Mutex<SiteState>>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self, url: &str, script: PageScript) {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(url.to_string(), script);
    }

    /// Make the next `times` navigations to URLs containing `url_part` time
    /// out; `condition` limits the rule to one wait mode.
    pub fn fail_navigation(&self, url_part: &str, condition: Option<WaitUntil>, times: usize) {
        self.state.lock().unwrap().nav_failures.push(NavFailure {
            url_part: url_part.to_string(),
            condition,
            remaining: times,
        });
    }

    pub fn fail_open(&self) {
        self.state.lock().unwrap().fail_open = true;
    }

    pub fn navigations(&self) -> Vec<(String, WaitUntil)> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn open(&self) -> Result<Box<dyn PageContext>, BrowserError> {
        if self.state.lock().unwrap().fail_open {
            return Err(BrowserError::SessionClosed);
        }
        Ok(Box::new(FakePage {
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakePage {
    state: Arc<Mutex<SiteState>>,
}

#[async_trait]
impl PageContext for FakePage {
    async fn navigate(
        &self,
        url: &str,
        wait: WaitUntil,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push((url.to_string(), wait));
        for failure in state.nav_failures.iter_mut() {
            if failure.remaining > 0
                && url.contains(failure.url_part.as_str())
                && failure.condition.map_or(true, |c| c == wait)
            {
                failure.remaining -= 1;
                return Err(BrowserError::NavigationTimeout {
                    url: url.to_string(),
                    condition: wait,
                    timeout,
                });
            }
        }
        state.current_url = url.to_string();
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, BrowserError> {
        let state = self.state.lock().unwrap();
        let page = state
            .pages
            .get(&state.current_url)
            .cloned()
            .unwrap_or_default();
        if script.contains("innerText") {
            return Ok(json!(page.body_text));
        }
        for (pattern, value) in &page.responses {
            if script.contains(pattern.as_str()) {
                return Ok(value.clone());
            }
        }
        if script.contains(".length") {
            Ok(json!(0))
        } else {
            Ok(json!([]))
        }
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<bool, BrowserError> {
        let state = self.state.lock().unwrap();
        let page = state
            .pages
            .get(&state.current_url)
            .cloned()
            .unwrap_or_default();
        Ok(page
            .responses
            .iter()
            .any(|(pattern, _)| selector.contains(pattern.as_str())))
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        self.state.lock().unwrap().clicks.push(selector.to_string());
        Ok(())
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}

/// Default configuration with all politeness delays and waits shrunk so a
/// test run takes milliseconds.
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.pacing.listing_delay = (0, 1);
    config.pacing.page_delay = 0;
    config.navigation.settle_delay = 0;
    config.extraction.content_wait = 0;
    config.extraction.consent_wait = 0;
    config.extraction.phone_reveal_settle = 0;
    config
}

/// Collect events until the terminal one (inclusive).
pub async fn drain(handle: &mut CrawlHandle) -> Vec<CrawlEvent> {
    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        let terminal = event.is_terminal();
        events.push(event);
        if terminal {
            break;
        }
    }
    events
}

/// JSON shape the card-probing script returns for one listing card.
pub fn card(href: &str, title: &str, price: &str, mileage: &str, year: &str) -> Value {
    json!({
        "href": href,
        "title": title,
        "price": price,
        "mileage": mileage,
        "year": year,
    })
}
