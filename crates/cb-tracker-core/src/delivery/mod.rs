//! Hybrid log delivery
//!
//! Records tagged immediate are posted one by one as soon as they are produced;
//! batched records wait in a queue flushed by size or time. Logs rejected for an
//! unknown parent notebook trigger a bounded create-then-retry recovery.

pub mod manager;
pub mod recovery;
pub mod stats;

pub use manager::LogManager;
pub use recovery::ParentRecovery;
pub use stats::{DeliveryStats, DeliveryStatsSnapshot};
