use serde::{Deserialize, Serialize};

use crate::extract::catalog;

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub crawl: CrawlSettings,
    pub pacing: PacingSettings,
    pub navigation: NavigationSettings,
    pub extraction: ExtractionSettings,
    pub browser: BrowserSettings,
}

/// Crawl-loop settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CrawlSettings {
    pub max_pages: u32,
    pub page_param: String,          // Query parameter carrying the results-page number
    pub listing_url_pattern: String, // Regex used by the generic listing-link fallback
    pub zero_result_markers: Vec<String>, // Defaults come from the site catalog
    pub event_buffer: usize,
}

/// Politeness delay settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PacingSettings {
    pub listing_delay: (u64, u64), // Min and max delay between listings in milliseconds
    pub page_delay: u64,           // Fixed delay between result pages in milliseconds
}

/// Navigation retry settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NavigationSettings {
    pub primary_timeout: u64,  // Network-settled attempt, milliseconds
    pub fallback_timeout: u64, // DOM-content-loaded attempt, milliseconds
    pub settle_delay: u64,     // Fixed pause after a successful fallback navigation
}

/// Field extraction settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExtractionSettings {
    pub content_wait: u64,        // How long to wait for listing content to appear, milliseconds
    pub consent_wait: u64,        // How long to probe for a cookie-consent banner
    pub phone_reveal_settle: u64, // Pause after clicking the phone-reveal control
    pub phone_country_prefix: String,
}

/// Browser session settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub headless: bool,
    pub user_agent: String,
    pub accept_language: String,
    pub window_size: (u32, u32),
    pub page_load_timeout: u64, // Driver-level page load cap in milliseconds
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawl: CrawlSettings {
                max_pages: 20,
                page_param: "page".to_string(),
                listing_url_pattern: r"/(aanbod|offres|offers|angebote)/[^\s'\x22]+".to_string(),
                zero_result_markers: catalog::zero_result_markers(),
                event_buffer: 32,
            },
            pacing: PacingSettings {
                listing_delay: (3000, 7000),
                page_delay: 5000,
            },
            navigation: NavigationSettings {
                primary_timeout: 30_000,
                fallback_timeout: 45_000,
                settle_delay: 3000,
            },
            extraction: ExtractionSettings {
                content_wait: 4000,
                consent_wait: 2500,
                phone_reveal_settle: 1500,
                phone_country_prefix: "32".to_string(),
            },
            browser: BrowserSettings {
                webdriver_url: "http://localhost:4444".to_string(),
                headless: true,
                user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
                accept_language: "nl-BE,nl;q=0.9,fr-BE;q=0.8,en;q=0.7".to_string(),
                window_size: (1920, 1080),
                page_load_timeout: 60_000,
            },
        }
    }
}
