//! A single user's health-tracking session.
//!
//! [`HealthSession`] owns the metric store and wires the pure engines
//! (summary, recommendations, emergency detection, reporting) to it. Each
//! caller gets its own session; there is no process-wide state. Query
//! operations take `&self` and never mutate anything.

use crate::config::Config;
use crate::core::{
    summarize, EmergencyAlert, EmergencyDetector, LatestVitals, MetricField, MetricSample,
    MetricStore, MetricValue, RecommendationEngine, Recommendations, ReportGenerator, SampleInput,
    Summary,
};
use crate::journal::{JsonlJournal, SampleJournal};
use crate::profile::UserProfile;
use crate::reminders::ReminderSchedule;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Session shared between request handlers.
pub type SharedSession = Arc<RwLock<HealthSession>>;

/// Non-sample state persisted alongside the journal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionState {
    user_id: Option<Uuid>,
    #[serde(default)]
    profile: UserProfile,
    #[serde(default)]
    reminders: ReminderSchedule,
}

/// Engine instance bound to one user.
pub struct HealthSession {
    user_id: Uuid,
    profile: UserProfile,
    store: MetricStore,
    reminders: ReminderSchedule,
    recommender: RecommendationEngine,
    detector: EmergencyDetector,
    reporter: ReportGenerator,
    journal: Option<Box<dyn SampleJournal>>,
    state_path: Option<PathBuf>,
}

impl HealthSession {
    /// In-memory session with default thresholds.
    pub fn new() -> Self {
        Self {
            user_id: Uuid::new_v4(),
            profile: UserProfile::default(),
            store: MetricStore::new(),
            reminders: ReminderSchedule::new(),
            recommender: RecommendationEngine::default(),
            detector: EmergencyDetector::default(),
            reporter: ReportGenerator::default(),
            journal: None,
            state_path: None,
        }
    }

    /// In-memory session using the thresholds and timezone from `config`.
    pub fn with_config(config: &Config) -> Result<Self> {
        let mut session = Self::new();
        session.recommender = RecommendationEngine::new(config.recommendation.clone());
        session.detector =
            EmergencyDetector::new(config.emergency.clone(), config.alert_precedence);
        session.reporter = ReportGenerator::new(config.report_timezone()?);
        Ok(session)
    }

    /// Attach a journal, replaying its samples into the store.
    pub fn with_journal(mut self, journal: Box<dyn SampleJournal>) -> Result<Self> {
        let samples = journal.load()?;
        let replayed = samples.len();
        for sample in samples {
            self.store.restore(sample)?;
        }
        if replayed > 0 {
            tracing::info!(samples = replayed, "Replayed sample journal");
        }
        self.journal = Some(journal);
        Ok(self)
    }

    /// Open the persistent session described by `config`.
    pub fn open(config: &Config) -> Result<Self> {
        let mut session = Self::with_config(config)?;

        let state_path = config.state_path();
        let fresh = !state_path.exists();
        if !fresh {
            let content = std::fs::read_to_string(&state_path)?;
            let state: SessionState = serde_json::from_str(&content)?;
            if let Some(user_id) = state.user_id {
                session.user_id = user_id;
            }
            session.profile = state.profile;
            session.reminders = state.reminders;
        }
        session.state_path = Some(state_path);

        if config.persist_samples {
            session = session.with_journal(Box::new(JsonlJournal::new(config.journal_path())))?;
        }

        // The user id must be stable from the first run on.
        if fresh {
            session.save()?;
            tracing::info!(user_id = %session.user_id, "Created health session state");
        }

        tracing::debug!(user_id = %session.user_id, "Opened health session");
        Ok(session)
    }

    /// Persist profile and reminders. No-op for in-memory sessions.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.state_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let state = SessionState {
            user_id: Some(self.user_id),
            profile: self.profile.clone(),
            reminders: self.reminders.clone(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&state)?)?;
        Ok(())
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Validate and record one sample.
    ///
    /// On error nothing is stored or journaled.
    pub fn record(&mut self, input: SampleInput) -> Result<&MetricSample> {
        self.record_at(input, Utc::now())
    }

    /// Record a sample stamped with `at` (clamped so timestamps never decrease).
    pub fn record_at(&mut self, input: SampleInput, at: DateTime<Utc>) -> Result<&MetricSample> {
        let sample = self.store.prepare(input, at)?;
        if let Some(journal) = self.journal.as_mut() {
            journal.append(&sample)?;
        }

        let sample = self.store.commit(sample);
        tracing::info!(
            fields = sample.len(),
            timestamp = %sample.timestamp,
            "Recorded health sample"
        );
        Ok(sample)
    }

    pub fn summary(&self) -> Summary {
        summarize(&self.store)
    }

    pub fn recommendations(&self) -> Recommendations {
        self.recommender.recommend(&self.summary())
    }

    /// The alert to surface for the latest vitals, if any.
    pub fn emergency_alert(&self) -> Option<EmergencyAlert> {
        let alert = self.detector.check(&LatestVitals::from_store(&self.store));
        if let Some(alert) = &alert {
            tracing::warn!(alert = ?alert, "Emergency alert");
        }
        alert
    }

    /// Every firing alert, most severe first.
    pub fn emergency_alerts(&self) -> Vec<EmergencyAlert> {
        self.detector
            .check_all(&LatestVitals::from_store(&self.store))
    }

    pub fn report(&self) -> String {
        self.report_at(Utc::now())
    }

    pub fn report_at(&self, generated_at: DateTime<Utc>) -> String {
        let summary = self.summary();
        let recommendations = self.recommender.recommend(&summary);
        self.reporter
            .generate_at(&summary, &recommendations, generated_at)
    }

    pub fn latest_value(&self, field: MetricField) -> Option<MetricValue> {
        self.store.latest_value(field)
    }

    pub fn store(&self) -> &MetricStore {
        &self.store
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn update_profile(&mut self, update: UserProfile) -> Result<()> {
        Ok(self.profile.merge(update)?)
    }

    pub fn personalize(&self, response: &str) -> String {
        self.profile.personalize(response)
    }

    pub fn reminders(&self) -> &ReminderSchedule {
        &self.reminders
    }

    pub fn reminders_mut(&mut self) -> &mut ReminderSchedule {
        &mut self.reminders
    }
}

impl Default for HealthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HealthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthSession")
            .field("user_id", &self.user_id)
            .field("samples", &self.store.len())
            .field("reminders", &self.reminders.len())
            .field("journaled", &self.journal.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AlertPrecedence, BloodPressure, ValidationError};
    use crate::journal::MemoryJournal;
    use crate::profile::ProfileError;
    use crate::HealthError;

    #[test]
    fn test_sessions_are_isolated() {
        let mut a = HealthSession::new();
        let b = HealthSession::new();

        a.record(SampleInput::new().with("heart_rate", 80)).unwrap();
        assert_eq!(a.store().len(), 1);
        assert!(b.store().is_empty());
        assert_ne!(a.user_id(), b.user_id());
    }

    #[test]
    fn test_rejected_sample_leaves_no_trace() {
        let mut session = HealthSession::new()
            .with_journal(Box::new(MemoryJournal::new()))
            .unwrap();

        let err = session
            .record(SampleInput::new().with("blood_pressure", "high"))
            .unwrap_err();
        assert!(matches!(
            err,
            HealthError::Validation(ValidationError::MalformedBloodPressure(_))
        ));
        assert!(session.store().is_empty());
        assert!(session.summary().is_empty());
    }

    #[test]
    fn test_journal_replay_keeps_timestamps() {
        let mut first = HealthSession::new();
        let at = Utc::now() - chrono::Duration::days(3);
        let sample = first
            .record_at(SampleInput::new().with("blood_pressure", "190/100"), at)
            .unwrap()
            .clone();

        let journal = MemoryJournal::with_samples(vec![sample.clone()]);
        let replayed = HealthSession::new().with_journal(Box::new(journal)).unwrap();

        assert_eq!(replayed.store().latest_sample(), Some(&sample));
        assert_eq!(
            replayed.latest_value(MetricField::BloodPressure),
            Some(MetricValue::BloodPressure(BloodPressure::new(190, 100)))
        );
        assert!(replayed.emergency_alert().is_some());
    }

    #[test]
    fn test_journal_replay_rejects_invalid_sample() {
        let mut values = std::collections::BTreeMap::new();
        values.insert(MetricField::BloodSugar, MetricValue::Number(-50.0));
        values.insert(MetricField::Bmi, MetricValue::Number(3.0));
        let bad = MetricSample::new(Utc::now(), values);

        let err = HealthSession::new()
            .with_journal(Box::new(MemoryJournal::with_samples(vec![bad])))
            .unwrap_err();
        assert!(matches!(
            err,
            HealthError::Validation(ValidationError::Negative { .. })
        ));
    }

    #[test]
    fn test_with_config_applies_precedence() {
        let config = Config {
            alert_precedence: AlertPrecedence::LastRuleWins,
            ..Default::default()
        };
        let mut session = HealthSession::with_config(&config).unwrap();
        session
            .record(
                SampleInput::new()
                    .with("blood_pressure", "185/95")
                    .with("heart_rate", 130),
            )
            .unwrap();

        assert!(matches!(
            session.emergency_alert(),
            Some(EmergencyAlert::Tachycardia { .. })
        ));
        assert_eq!(session.emergency_alerts().len(), 2);
    }

    #[test]
    fn test_update_profile_rejects_bad_age() {
        let mut session = HealthSession::new();
        let err = session
            .update_profile(UserProfile {
                age: Some(200),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(
            err,
            HealthError::Profile(ProfileError::AgeOutOfRange(200))
        ));
    }
}
