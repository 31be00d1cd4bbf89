//! Cardio Health Assistant - cardiovascular health tracking engine.
//!
//! This library records timestamped cardiovascular and lifestyle metrics,
//! summarizes them, derives rule-based recommendations, detects emergency
//! conditions from the latest vitals and renders plain-text reports.
//!
//! # Safety Notice
//!
//! - **Not a diagnosis**: Recommendations and alerts are informational only
//! - **Rule based**: Thresholds are fixed clinical cut-offs, configurable
//! - **Local only**: Samples stay on this machine unless you export them
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Cardio Health Assistant                  │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────────┐     │
//! │  │ SampleInput │──▶│ MetricStore │──▶│    Summary      │     │
//! │  │ (validate)  │   │ (append)    │   │  (per field)    │     │
//! │  └─────────────┘   └─────────────┘   └─────────────────┘     │
//! │         │                 │                  │               │
//! │         ▼                 ▼                  ▼               │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────────┐     │
//! │  │   Journal   │   │  Emergency  │   │ Recommendations │     │
//! │  │  (JSONL)    │   │  Detector   │   │   + Report      │     │
//! │  └─────────────┘   └─────────────┘   └─────────────────┘     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use cardio_health_assistant::{HealthSession, SampleInput};
//!
//! let mut session = HealthSession::new();
//! session
//!     .record(SampleInput::new().with("blood_pressure", "185/95"))
//!     .unwrap();
//!
//! assert!(session.emergency_alert().is_some());
//! println!("{}", session.report());
//! ```

pub mod activity;
pub mod config;
pub mod core;
pub mod journal;
pub mod profile;
pub mod reminders;
pub mod session;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use activity::{ActivityLog, ActivityStats, SharedActivityLog};
pub use config::{Config, ConfigError};
pub use crate::core::{
    summarize, AlertPrecedence, BloodPressure, EmergencyAlert, EmergencyDetector, FieldSummary,
    MetricField, MetricSample, MetricStore, MetricValue, RecommendationEngine, Recommendations,
    ReportGenerator, SampleInput, Summary, ValidationError,
};
pub use journal::{JournalError, JsonlJournal, MemoryJournal, SampleJournal};
pub use profile::{ProfileError, UserProfile};
pub use reminders::{Reminder, ReminderError, ReminderId, ReminderKind, ReminderSchedule};
pub use session::{HealthSession, SharedSession};

use thiserror::Error;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate-level error.
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("invalid sample: {0}")]
    Validation(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("reminder error: {0}")]
    Reminder(#[from] ReminderError),

    #[error("invalid profile: {0}")]
    Profile(#[from] ProfileError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HealthError>;

/// Medical disclaimer that can be displayed to users.
pub const MEDICAL_DISCLAIMER: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║           CARDIO HEALTH ASSISTANT - MEDICAL DISCLAIMER           ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This tool tracks health metrics you enter yourself.             ║
║                                                                  ║
║  ✓ WHAT IT DOES:                                                 ║
║    • Summarizes blood pressure, heart rate, cholesterol,         ║
║      blood sugar, weight, BMI and exercise                       ║
║    • Suggests general lifestyle recommendations                  ║
║    • Flags readings that may need urgent attention               ║
║                                                                  ║
║  ✗ WHAT IT IS NOT:                                               ║
║    • A medical device or a diagnosis                             ║
║    • A substitute for a healthcare professional                  ║
║    • An emergency service                                        ║
║                                                                  ║
║  If you feel unwell or a reading is critically high, contact     ║
║  your doctor or emergency services immediately.                  ║
║                                                                  ║
║  All data is stored locally. View activity anytime with:         ║
║    cardio-health status                                          ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
