//! Two-attempt navigation policy shared by search and listing pages.

use std::time::Duration;

use tracing::{debug, warn};

use crate::browser::{BrowserError, PageContext, WaitUntil};
use crate::config::NavigationSettings;

/// Which attempt got the page loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    Primary,
    Fallback,
}

/// First try waits for the network to settle; if that fails, one relaxed
/// retry waits only for the DOM plus a fixed settle pause. There is no
/// third attempt.
#[derive(Debug, Clone)]
pub struct NavigationPolicy {
    primary_timeout: Duration,
    fallback_timeout: Duration,
    settle_delay: Duration,
}

impl NavigationPolicy {
    pub fn new(settings: &NavigationSettings) -> Self {
        Self {
            primary_timeout: Duration::from_millis(settings.primary_timeout),
            fallback_timeout: Duration::from_millis(settings.fallback_timeout),
            settle_delay: Duration::from_millis(settings.settle_delay),
        }
    }

    pub async fn goto(
        &self,
        page: &dyn PageContext,
        url: &str,
    ) -> Result<NavOutcome, BrowserError> {
        match page
            .navigate(url, WaitUntil::NetworkSettled, self.primary_timeout)
            .await
        {
            Ok(()) => {
                debug!("loaded {} on the first attempt", url);
                Ok(NavOutcome::Primary)
            }
            Err(first) => {
                warn!(
                    "navigation to {} failed ({}), retrying with a relaxed wait",
                    url, first
                );
                page.navigate(url, WaitUntil::DomContentLoaded, self.fallback_timeout)
                    .await?;
                tokio::time::sleep(self.settle_delay).await;
                Ok(NavOutcome::Fallback)
            }
        }
    }
}
