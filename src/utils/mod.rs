pub mod logging;

// Re-export common functions and types
pub use logging::{default_log_file, init_logging};
