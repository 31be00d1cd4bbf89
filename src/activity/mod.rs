//! Activity accounting for the assistant.
//!
//! Counts what the user did through the CLI or HTTP surface so that the
//! `status` command can show it. Nothing about the recorded values is kept
//! here, only totals.

pub mod log;

// Re-export commonly used types
pub use log::{create_shared_log, ActivityLog, ActivityStats, SharedActivityLog};
