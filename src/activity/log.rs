//! Usage counters persisted between runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Activity counters for the current and previous runs.
#[derive(Debug)]
pub struct ActivityLog {
    /// Number of samples accepted into the store
    samples_recorded: AtomicU64,
    /// Number of reports generated
    reports_generated: AtomicU64,
    /// Number of emergency alerts surfaced
    alerts_raised: AtomicU64,
    /// Number of reminders scheduled
    reminders_set: AtomicU64,
    /// Start of the current run
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self {
            samples_recorded: AtomicU64::new(0),
            reports_generated: AtomicU64::new(0),
            alerts_raised: AtomicU64::new(0),
            reminders_set: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create an activity log backed by a JSON file, loading prior totals.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!(error = %e, "Could not load previous activity stats");
        }

        log
    }

    pub fn record_sample(&self) {
        self.samples_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_report(&self) {
        self.reports_generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_alerts(&self, count: u64) {
        self.alerts_raised.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_reminder(&self) {
        self.reminders_set.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> ActivityStats {
        ActivityStats {
            samples_recorded: self.samples_recorded.load(Ordering::Relaxed),
            reports_generated: self.reports_generated.load(Ordering::Relaxed),
            alerts_raised: self.alerts_raised.load(Ordering::Relaxed),
            reminders_set: self.reminders_set.load(Ordering::Relaxed),
            session_start: self.session_start,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Activity:\n\
             - Samples recorded: {}\n\
             - Reports generated: {}\n\
             - Emergency alerts raised: {}\n\
             - Reminders set: {}",
            stats.samples_recorded,
            stats.reports_generated,
            stats.alerts_raised,
            stats.reminders_set,
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                samples_recorded: stats.samples_recorded,
                reports_generated: stats.reports_generated,
                alerts_raised: stats.alerts_raised,
                reminders_set: stats.reminders_set,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.samples_recorded
                    .store(persisted.samples_recorded, Ordering::Relaxed);
                self.reports_generated
                    .store(persisted.reports_generated, Ordering::Relaxed);
                self.alerts_raised
                    .store(persisted.alerts_raised, Ordering::Relaxed);
                self.reminders_set
                    .store(persisted.reminders_set, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of activity counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityStats {
    pub samples_recorded: u64,
    pub reports_generated: u64,
    pub alerts_raised: u64,
    pub reminders_set: u64,
    pub session_start: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    samples_recorded: u64,
    reports_generated: u64,
    alerts_raised: u64,
    reminders_set: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared activity log.
pub type SharedActivityLog = Arc<ActivityLog>;

pub fn create_shared_log() -> SharedActivityLog {
    Arc::new(ActivityLog::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_counting() {
        let log = ActivityLog::new();

        log.record_sample();
        log.record_sample();
        log.record_alerts(2);
        log.record_report();

        let stats = log.stats();
        assert_eq!(stats.samples_recorded, 2);
        assert_eq!(stats.alerts_raised, 2);
        assert_eq!(stats.reports_generated, 1);
        assert_eq!(stats.reminders_set, 0);
    }

    #[test]
    fn test_persistence_roundtrip() {
        let path = std::env::temp_dir()
            .join("cardio-health-activity-test")
            .join(format!("{}.json", uuid::Uuid::new_v4()));

        let log = ActivityLog::with_persistence(path.clone());
        log.record_sample();
        log.record_reminder();
        log.save().unwrap();

        let reloaded = ActivityLog::with_persistence(path.clone());
        let stats = reloaded.stats();
        assert_eq!(stats.samples_recorded, 1);
        assert_eq!(stats.reminders_set, 1);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_summary_format() {
        let summary = ActivityLog::new().summary();
        assert!(summary.contains("Samples recorded: 0"));
        assert!(summary.contains("Emergency alerts raised"));
    }
}
