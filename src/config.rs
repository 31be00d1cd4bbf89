//! Configuration for the Cardio Health Assistant.

use crate::core::{AlertPrecedence, EmergencyThresholds, RecommendationThresholds};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main configuration for the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path for the sample journal, session state and activity log
    pub data_path: PathBuf,

    /// Default directory for exported reports
    pub export_path: PathBuf,

    /// Whether recorded samples are journaled to disk
    pub persist_samples: bool,

    /// IANA timezone used for the report header
    pub timezone: String,

    /// Look-ahead window for upcoming reminders
    #[serde(with = "duration_serde")]
    pub reminder_horizon: Duration,

    /// Recommendation rule thresholds
    pub recommendation: RecommendationThresholds,

    /// Emergency rule thresholds
    pub emergency: EmergencyThresholds,

    /// Which alert `check` surfaces when several rules fire
    pub alert_precedence: AlertPrecedence,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cardio-health-assistant");

        Self {
            export_path: data_dir.join("reports"),
            data_path: data_dir,
            persist_samples: true,
            timezone: "UTC".to_string(),
            reminder_horizon: Duration::from_secs(24 * 60 * 60),
            recommendation: RecommendationThresholds::default(),
            emergency: EmergencyThresholds::default(),
            alert_precedence: AlertPrecedence::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content).map_err(ConfigError::Parse)?;
            config.report_timezone()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cardio-health-assistant")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)?;
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }

    pub fn journal_path(&self) -> PathBuf {
        self.data_path.join("samples.jsonl")
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_path.join("session.json")
    }

    pub fn activity_path(&self) -> PathBuf {
        self.data_path.join("activity.json")
    }

    /// Parsed report timezone.
    pub fn report_timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    pub fn reminder_horizon(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.reminder_horizon)
            .unwrap_or_else(|_| chrono::Duration::hours(24))
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),
}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.persist_samples);
        assert_eq!(config.report_timezone().unwrap(), Tz::UTC);
        assert_eq!(config.alert_precedence, AlertPrecedence::Severity);
        assert_eq!(config.reminder_horizon(), chrono::Duration::hours(24));
        assert!(config.journal_path().ends_with("samples.jsonl"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"timezone": "America/New_York", "reminder_horizon": 3600}"#)
                .unwrap();
        assert_eq!(config.report_timezone().unwrap(), chrono_tz::America::New_York);
        assert_eq!(config.reminder_horizon, Duration::from_secs(3600));
        assert_eq!(config.emergency.systolic_crisis, 180);
    }

    #[test]
    fn test_invalid_timezone() {
        let config = Config {
            timezone: "Mars/Olympus".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.report_timezone(),
            Err(ConfigError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn test_config_roundtrip_json() {
        let config = Config {
            alert_precedence: AlertPrecedence::LastRuleWins,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.alert_precedence, AlertPrecedence::LastRuleWins);
    }
}
