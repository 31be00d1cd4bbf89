//! Emergency detection over the latest known vitals.
//!
//! Two rules are evaluated in a fixed order:
//! 1. Hypertensive crisis: systolic ≥ 180 or diastolic ≥ 120 mmHg.
//! 2. Tachycardia: heart rate > 120 bpm.
//!
//! When both fire, [`AlertPrecedence`] decides which single alert
//! [`EmergencyDetector::check`] returns. The default ranks by severity, so a
//! hypertensive crisis is never masked by a concurrent tachycardia alert.
//! [`EmergencyDetector::check_all`] returns every firing alert.
//!
//! Detection never fails on missing data: absent vitals simply do not fire.

use crate::core::sample::{BloodPressure, MetricField};
use crate::core::store::MetricStore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Latest known values of the vitals the detector looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestVitals {
    pub blood_pressure: Option<BloodPressure>,
    pub heart_rate: Option<f64>,
}

impl LatestVitals {
    pub fn from_store(store: &MetricStore) -> Self {
        Self {
            blood_pressure: store
                .latest_value(MetricField::BloodPressure)
                .and_then(|v| v.as_blood_pressure()),
            heart_rate: store
                .latest_value(MetricField::HeartRate)
                .and_then(|v| v.as_number()),
        }
    }
}

/// An urgent alert raised by out-of-range vitals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmergencyAlert {
    HypertensiveCrisis { reading: BloodPressure },
    Tachycardia { heart_rate: f64 },
}

impl EmergencyAlert {
    pub fn message(&self) -> &'static str {
        match self {
            EmergencyAlert::HypertensiveCrisis { .. } => {
                "Your blood pressure is critically high. Please seek immediate medical attention!"
            }
            EmergencyAlert::Tachycardia { .. } => {
                "Your heart rate is unusually high. Consider seeing a healthcare provider if this persists."
            }
        }
    }

    /// Higher is more urgent.
    pub fn severity(&self) -> u8 {
        match self {
            EmergencyAlert::HypertensiveCrisis { .. } => 2,
            EmergencyAlert::Tachycardia { .. } => 1,
        }
    }
}

impl fmt::Display for EmergencyAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// How a single alert is chosen when several rules fire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPrecedence {
    /// Most severe alert wins.
    #[default]
    Severity,
    /// Later-evaluated rule overwrites earlier ones (heart rate beats blood pressure).
    LastRuleWins,
}

/// Emergency rule thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyThresholds {
    /// Inclusive systolic crisis threshold (mmHg)
    pub systolic_crisis: u32,
    /// Inclusive diastolic crisis threshold (mmHg)
    pub diastolic_crisis: u32,
    /// Exclusive tachycardia threshold (bpm)
    pub tachycardia_heart_rate: f64,
}

impl Default for EmergencyThresholds {
    fn default() -> Self {
        Self {
            systolic_crisis: 180,
            diastolic_crisis: 120,
            tachycardia_heart_rate: 120.0,
        }
    }
}

/// Stateless, side-effect free emergency rule evaluator.
#[derive(Debug, Clone, Default)]
pub struct EmergencyDetector {
    thresholds: EmergencyThresholds,
    precedence: AlertPrecedence,
}

impl EmergencyDetector {
    pub fn new(thresholds: EmergencyThresholds, precedence: AlertPrecedence) -> Self {
        Self {
            thresholds,
            precedence,
        }
    }

    pub fn precedence(&self) -> AlertPrecedence {
        self.precedence
    }

    /// The single alert to surface, if any.
    pub fn check(&self, vitals: &LatestVitals) -> Option<EmergencyAlert> {
        let fired = self.evaluate(vitals);
        match self.precedence {
            AlertPrecedence::Severity => fired.into_iter().max_by_key(EmergencyAlert::severity),
            AlertPrecedence::LastRuleWins => fired.last().copied(),
        }
    }

    /// Every firing alert, most severe first.
    pub fn check_all(&self, vitals: &LatestVitals) -> Vec<EmergencyAlert> {
        let mut fired = self.evaluate(vitals);
        fired.sort_by_key(|alert| std::cmp::Reverse(alert.severity()));
        fired
    }

    /// Rules in evaluation order.
    fn evaluate(&self, vitals: &LatestVitals) -> Vec<EmergencyAlert> {
        let t = &self.thresholds;
        let mut fired = Vec::new();

        if let Some(reading) = vitals.blood_pressure {
            if reading.systolic >= t.systolic_crisis || reading.diastolic >= t.diastolic_crisis {
                fired.push(EmergencyAlert::HypertensiveCrisis { reading });
            }
        }

        if let Some(heart_rate) = vitals.heart_rate {
            if heart_rate > t.tachycardia_heart_rate {
                fired.push(EmergencyAlert::Tachycardia { heart_rate });
            }
        }

        fired
    }
}
