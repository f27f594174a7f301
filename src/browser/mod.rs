pub mod script;
pub mod webdriver;

// Re-export common types
pub use webdriver::WebDriverBrowser;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

/// Errors at the browser capability boundary
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("webdriver error: {0}")]
    Driver(#[from] thirtyfour::error::WebDriverError),

    #[error("navigation to {url} did not reach {condition:?} within {timeout:?}")]
    NavigationTimeout {
        url: String,
        condition: WaitUntil,
        timeout: Duration,
    },

    #[error("script result had an unexpected shape: {0}")]
    ScriptResult(#[from] serde_json::Error),

    #[error("browser session is closed")]
    SessionClosed,
}

/// Page readiness condition a navigation waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// DOM parsed; subresources may still be loading
    DomContentLoaded,
    /// Document fully loaded and given a moment of network quiet
    NetworkSettled,
}

/// Capability surface of one driven browser tab, as consumed by the crawl engine
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PageContext: Send + Sync {
    /// Navigate to a URL and wait until the page satisfies `wait`
    async fn navigate(&self, url: &str, wait: WaitUntil, timeout: Duration)
        -> Result<(), BrowserError>;

    /// Evaluate a script in the page and return its JSON result
    async fn evaluate(&self, script: &str) -> Result<Value, BrowserError>;

    /// Wait for a selector to appear; `Ok(false)` when it never did
    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
        -> Result<bool, BrowserError>;

    /// Click the first element matching the selector
    async fn click(&self, selector: &str) -> Result<(), BrowserError>;

    /// Tear down the tab and its session
    async fn close(&self) -> Result<(), BrowserError>;
}

/// Opens fresh page contexts; a crawl job owns exactly one
#[async_trait]
pub trait Browser: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageContext>, BrowserError>;
}
