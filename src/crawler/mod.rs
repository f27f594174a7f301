pub mod collector;
pub mod detail;
pub mod events;
pub mod job;
pub mod navigate;
pub mod orchestrator;
pub mod pacing;

// Re-export common types
pub use events::{CrawlEvent, CrawlHandle, EventSink};
pub use job::{CrawlJob, CrawlRequest, RunStats, VehicleRecord};
pub use orchestrator::CrawlOrchestrator;
