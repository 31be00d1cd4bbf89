//! Core health-metrics engine.
//!
//! This module contains:
//! - The validated sample schema and the append-only metric store
//! - Statistical summaries per tracked field
//! - Rule-based recommendations and emergency detection
//! - Plain-text report generation
//!
//! Everything here is pure in-memory computation; persistence and delivery
//! channels live outside the core.

pub mod emergency;
pub mod recommendations;
pub mod report;
pub mod sample;
pub mod store;
pub mod summary;

// Re-export commonly used types
pub use emergency::{
    AlertPrecedence, EmergencyAlert, EmergencyDetector, EmergencyThresholds, LatestVitals,
};
pub use recommendations::{
    Advisory, RecommendationEngine, RecommendationThresholds, Recommendations, NO_RECOMMENDATIONS,
};
pub use report::{ReportGenerator, REPORT_TITLE};
pub use sample::{
    BloodPressure, FieldValue, MetricField, MetricSample, MetricValue, SampleInput,
    ValidationError,
};
pub use store::MetricStore;
pub use summary::{summarize, AxisStats, BloodPressureSummary, FieldSummary, NumericSummary, Summary};
