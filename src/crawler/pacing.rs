//! Politeness delays between page loads and listing visits.

use std::time::Duration;

use rand::{thread_rng, Rng};
use tracing::debug;

use crate::config::PacingSettings;

/// Enforces the crawl rhythm: a randomized pause after each listing and a
/// fixed pause between result pages.
#[derive(Debug, Clone)]
pub struct Pacer {
    config: PacingSettings,
}

impl Pacer {
    pub fn new(config: PacingSettings) -> Self {
        Self { config }
    }

    fn listing_delay(&self) -> Duration {
        let (min, max) = self.config.listing_delay;
        let millis = if max > min {
            thread_rng().gen_range(min..=max)
        } else {
            min
        };
        Duration::from_millis(millis)
    }

    fn page_delay(&self) -> Duration {
        Duration::from_millis(self.config.page_delay)
    }

    /// Sleep for a randomized interval before moving to the next listing
    pub async fn pause_between_listings(&self) {
        let delay = self.listing_delay();
        debug!("pausing {:?} before the next listing", delay);
        tokio::time::sleep(delay).await;
    }

    /// Sleep for the fixed interval before loading the next results page
    pub async fn pause_between_pages(&self) {
        let delay = self.page_delay();
        debug!("pausing {:?} before the next results page", delay);
        tokio::time::sleep(delay).await;
    }
}
