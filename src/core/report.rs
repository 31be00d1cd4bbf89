//! Plain-text health report.
//!
//! Layout: a header with the generation time, one section per summarized
//! field with its statistics in fixed two-decimal format, then the
//! recommendation block. Output depends only on its inputs and the
//! generation timestamp.

use crate::core::recommendations::Recommendations;
use crate::core::summary::{FieldSummary, Summary};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// First line of every report.
pub const REPORT_TITLE: &str = "Comprehensive Health Metrics Report";

const NO_METRICS: &str = "No health metrics recorded yet.";

/// Formats summaries and recommendations into a report.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    /// Timezone used for the header timestamp
    timezone: Tz,
}

impl ReportGenerator {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Generate a report stamped with the current time.
    pub fn generate(&self, summary: &Summary, recommendations: &Recommendations) -> String {
        self.generate_at(summary, recommendations, Utc::now())
    }

    /// Generate a report stamped with `generated_at`.
    pub fn generate_at(
        &self,
        summary: &Summary,
        recommendations: &Recommendations,
        generated_at: DateTime<Utc>,
    ) -> String {
        let mut lines = vec![
            REPORT_TITLE.to_string(),
            format!(
                "Report Generated: {}",
                generated_at
                    .with_timezone(&self.timezone)
                    .format("%Y-%m-%d %H:%M:%S %Z")
            ),
            String::new(),
        ];

        if summary.is_empty() {
            lines.push(NO_METRICS.to_string());
            lines.push(String::new());
        }

        for (field, stats) in summary.iter() {
            lines.push(format!("{} ({}):", field.label(), field.unit()));
            match stats {
                FieldSummary::Numeric(s) => {
                    lines.push(format!("  Average: {:.2}", s.average));
                    lines.push(format!("  Min: {:.2}", s.min));
                    lines.push(format!("  Max: {:.2}", s.max));
                    lines.push(format!("  Last: {:.2}", s.last));
                }
                FieldSummary::BloodPressure(s) => {
                    lines.push(format!(
                        "  Average: {:.2}/{:.2}",
                        s.systolic.average, s.diastolic.average
                    ));
                    lines.push(format!("  Min: {:.2}/{:.2}", s.systolic.min, s.diastolic.min));
                    lines.push(format!("  Max: {:.2}/{:.2}", s.systolic.max, s.diastolic.max));
                    lines.push(format!("  Last: {}", s.last));
                }
            }
            lines.push(String::new());
        }

        lines.push(recommendations.to_string());
        lines.join("\n")
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}
