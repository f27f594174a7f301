use anyhow::{Context, Result};
use tracing::{error, info};

use lotcrawler::cli;
use lotcrawler::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = cli::parse_args();

    // Initialize logging
    let log_file = args
        .log_file
        .clone()
        .or_else(|| args.log_to_file.then(logging::default_log_file));
    logging::init_logging(args.verbose, log_file).context("could not initialize logging")?;

    info!("Starting lotcrawler v{}", env!("CARGO_PKG_VERSION"));

    match cli::run(args).await {
        Ok(0) => {
            info!("Crawl completed successfully");
            Ok(())
        }
        Ok(code) => {
            error!("Crawl ended with an error");
            std::process::exit(code);
        }
        Err(e) => {
            error!("Crawl failed: {}", e);
            Err(e)
        }
    }
}
