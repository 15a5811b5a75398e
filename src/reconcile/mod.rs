pub mod engine;
pub mod recency;

pub use engine::ReconcileEngine;
pub use recency::{DEFAULT_RECENCY_WINDOW, RecencyExpiry, RecencyTracker};
