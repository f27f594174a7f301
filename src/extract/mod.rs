pub mod cascade;
pub mod catalog;
pub mod normalize;

// Re-export common types
pub use cascade::{CascadeHit, SelectorGroup};
