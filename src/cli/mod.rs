use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use crate::browser::{Browser, WebDriverBrowser};
use crate::config::Config;
use crate::crawler::{CrawlEvent, CrawlOrchestrator, CrawlRequest};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Search-results URL to crawl
    #[arg(required = true)]
    pub url: String,

    /// Crawl only the first results page
    #[arg(long)]
    pub single_page: bool,

    /// Maximum number of result pages to walk
    #[arg(short, long)]
    pub max_pages: Option<u32>,

    /// WebDriver endpoint to connect to
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Run the browser with a visible window
    #[arg(long)]
    pub headed: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Also write logs to the default log file
    #[arg(long)]
    pub log_to_file: bool,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Parse command line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Default configuration with the command-line overrides applied
pub fn build_config(cli: &Cli) -> Config {
    let mut config = Config::default();
    if let Some(max_pages) = cli.max_pages {
        config.crawl.max_pages = max_pages.max(1);
    }
    if let Some(url) = &cli.webdriver_url {
        config.browser.webdriver_url = url.clone();
    }
    if cli.headed {
        config.browser.headless = false;
    }
    config
}

/// Run one crawl and print its events to stdout as JSON lines. Returns the
/// process exit code: non-zero when the crawl ended with an error event.
pub async fn run(cli: Cli) -> Result<i32> {
    let config = build_config(&cli);
    let request = CrawlRequest {
        search_url: cli.url.clone(),
        multi_page: !cli.single_page,
    };

    let browser: Arc<dyn Browser> = Arc::new(WebDriverBrowser::new(config.browser.clone()));
    let orchestrator = CrawlOrchestrator::new(config, browser)?;
    let mut handle = orchestrator.spawn(request)?;
    info!("crawl job {} started", handle.id);

    let cancel = handle.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping the crawl");
            cancel.cancel();
        }
    });

    let mut exit_code = 0;
    while let Some(event) = handle.next_event().await {
        println!("{}", serde_json::to_string(&event)?);
        if let CrawlEvent::Error { .. } = event {
            exit_code = 1;
        }
        if event.is_terminal() {
            break;
        }
    }

    Ok(exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert()
    }

    #[test]
    fn overrides_land_in_the_config() {
        let cli = Cli::parse_from([
            "lotcrawler",
            "https://cars.example/lst?make=bmw",
            "--max-pages",
            "5",
            "--webdriver-url",
            "http://driver:4444",
            "--headed",
        ]);
        let config = build_config(&cli);
        assert_eq!(config.crawl.max_pages, 5);
        assert_eq!(config.browser.webdriver_url, "http://driver:4444");
        assert!(!config.browser.headless);
    }

    #[test]
    fn a_zero_page_budget_is_bumped_to_one() {
        let cli = Cli::parse_from(["lotcrawler", "https://cars.example/lst", "-m", "0"]);
        assert_eq!(build_config(&cli).crawl.max_pages, 1);
    }
}
