//! Rule-based lifestyle recommendations.
//!
//! Each rule is evaluated independently against the *latest* value of its
//! field in the summary (not the average). Rules are non-exclusive and are
//! emitted in a fixed evaluation order: heart rate, BMI, cholesterol, blood
//! sugar, exercise.

use crate::core::sample::MetricField;
use crate::core::summary::Summary;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message returned when no rule fires.
pub const NO_RECOMMENDATIONS: &str =
    "No specific health recommendations at this time. Keep tracking your metrics!";

/// Heading of the recommendation block in reports.
pub const RECOMMENDATIONS_HEADING: &str = "Personalized Health Recommendations:";

/// Rule thresholds. Defaults follow common clinical cut-offs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationThresholds {
    /// Resting heart rate below this is flagged as low (bpm)
    pub heart_rate_low: f64,
    /// Resting heart rate above this is flagged as high (bpm)
    pub heart_rate_high: f64,
    pub bmi_underweight: f64,
    pub bmi_obese: f64,
    /// mg/dL
    pub cholesterol_total_high: f64,
    pub cholesterol_hdl_low: f64,
    pub cholesterol_ldl_high: f64,
    /// Fasting blood sugar above this suggests screening (mg/dL)
    pub blood_sugar_high: f64,
    /// Recommended weekly activity (minutes)
    pub weekly_exercise_minutes: f64,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            heart_rate_low: 60.0,
            heart_rate_high: 100.0,
            bmi_underweight: 18.5,
            bmi_obese: 30.0,
            cholesterol_total_high: 240.0,
            cholesterol_hdl_low: 40.0,
            cholesterol_ldl_high: 160.0,
            blood_sugar_high: 125.0,
            weekly_exercise_minutes: 150.0,
        }
    }
}

/// A single advisory produced by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    LowRestingHeartRate,
    HighRestingHeartRate,
    Underweight,
    Obesity,
    HighTotalCholesterol,
    LowHdlCholesterol,
    HighLdlCholesterol,
    HighBloodSugar,
    InsufficientExercise,
}

impl Advisory {
    pub fn message(self) -> &'static str {
        match self {
            Advisory::LowRestingHeartRate => {
                "Your resting heart rate is low. Consider consulting a healthcare professional."
            }
            Advisory::HighRestingHeartRate => {
                "Your resting heart rate is high. Focus on stress reduction and cardiovascular exercise."
            }
            Advisory::Underweight => {
                "You are underweight. Consult a nutritionist to develop a healthy weight gain plan."
            }
            Advisory::Obesity => {
                "Your BMI indicates obesity. Consider a comprehensive weight management program."
            }
            Advisory::HighTotalCholesterol => {
                "Your total cholesterol is high. Consider dietary changes and consult your doctor."
            }
            Advisory::LowHdlCholesterol => {
                "Your HDL (good) cholesterol is low. Increase exercise and consider omega-3 rich foods."
            }
            Advisory::HighLdlCholesterol => {
                "Your LDL (bad) cholesterol is elevated. Discuss statin options with your healthcare provider."
            }
            Advisory::HighBloodSugar => {
                "Your blood sugar is high. Consider diabetes screening and lifestyle modifications."
            }
            Advisory::InsufficientExercise => {
                "You're not meeting recommended weekly exercise. Aim for 150 minutes of moderate activity."
            }
        }
    }

    /// Field the rule was evaluated against.
    pub fn field(self) -> MetricField {
        match self {
            Advisory::LowRestingHeartRate | Advisory::HighRestingHeartRate => MetricField::HeartRate,
            Advisory::Underweight | Advisory::Obesity => MetricField::Bmi,
            Advisory::HighTotalCholesterol => MetricField::CholesterolTotal,
            Advisory::LowHdlCholesterol => MetricField::CholesterolHdl,
            Advisory::HighLdlCholesterol => MetricField::CholesterolLdl,
            Advisory::HighBloodSugar => MetricField::BloodSugar,
            Advisory::InsufficientExercise => MetricField::ExerciseMinutes,
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Ordered result of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendations {
    advisories: Vec<Advisory>,
}

impl Recommendations {
    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    /// True when no rule fired.
    pub fn is_empty(&self) -> bool {
        self.advisories.is_empty()
    }

    /// Advisory texts; a single neutral message when nothing fired.
    pub fn messages(&self) -> Vec<String> {
        if self.advisories.is_empty() {
            return vec![NO_RECOMMENDATIONS.to_string()];
        }
        self.advisories
            .iter()
            .map(|advisory| advisory.message().to_string())
            .collect()
    }
}

impl fmt::Display for Recommendations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.advisories.is_empty() {
            return f.write_str(NO_RECOMMENDATIONS);
        }
        write!(f, "{RECOMMENDATIONS_HEADING}")?;
        for advisory in &self.advisories {
            write!(f, "\n• {advisory}")?;
        }
        Ok(())
    }
}

/// Stateless evaluator of the recommendation rule set.
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    thresholds: RecommendationThresholds,
}

impl RecommendationEngine {
    pub fn new(thresholds: RecommendationThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &RecommendationThresholds {
        &self.thresholds
    }

    pub fn recommend(&self, summary: &Summary) -> Recommendations {
        let t = &self.thresholds;
        let mut advisories = Vec::new();

        if let Some(hr) = summary.last_number(MetricField::HeartRate) {
            if hr < t.heart_rate_low {
                advisories.push(Advisory::LowRestingHeartRate);
            } else if hr > t.heart_rate_high {
                advisories.push(Advisory::HighRestingHeartRate);
            }
        }

        if let Some(bmi) = summary.last_number(MetricField::Bmi) {
            if bmi < t.bmi_underweight {
                advisories.push(Advisory::Underweight);
            } else if bmi > t.bmi_obese {
                advisories.push(Advisory::Obesity);
            }
        }

        // Cholesterol rules need the full panel; partial data yields nothing.
        if let (Some(total), Some(hdl), Some(ldl)) = (
            summary.last_number(MetricField::CholesterolTotal),
            summary.last_number(MetricField::CholesterolHdl),
            summary.last_number(MetricField::CholesterolLdl),
        ) {
            if total > t.cholesterol_total_high {
                advisories.push(Advisory::HighTotalCholesterol);
            }
            if hdl < t.cholesterol_hdl_low {
                advisories.push(Advisory::LowHdlCholesterol);
            }
            if ldl > t.cholesterol_ldl_high {
                advisories.push(Advisory::HighLdlCholesterol);
            }
        }

        if let Some(sugar) = summary.last_number(MetricField::BloodSugar) {
            if sugar > t.blood_sugar_high {
                advisories.push(Advisory::HighBloodSugar);
            }
        }

        if let Some(minutes) = summary.last_number(MetricField::ExerciseMinutes) {
            if minutes < t.weekly_exercise_minutes {
                advisories.push(Advisory::InsufficientExercise);
            }
        }

        Recommendations { advisories }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sample::SampleInput;
    use crate::core::store::MetricStore;
    use crate::core::summary::summarize;

    fn recommend_for(samples: Vec<SampleInput>) -> Recommendations {
        let mut store = MetricStore::new();
        for sample in samples {
            store.append(sample).unwrap();
        }
        RecommendationEngine::default().recommend(&summarize(&store))
    }

    #[test]
    fn test_empty_summary_gives_neutral_message() {
        let recs = RecommendationEngine::default().recommend(&Summary::default());
        assert!(recs.is_empty());
        assert_eq!(recs.messages(), vec![NO_RECOMMENDATIONS.to_string()]);
        assert_eq!(recs.to_string(), NO_RECOMMENDATIONS);
    }

    #[test]
    fn test_heart_rate_rules() {
        let recs = recommend_for(vec![SampleInput::new().with("heart_rate", 55)]);
        assert_eq!(recs.advisories(), &[Advisory::LowRestingHeartRate]);

        let recs = recommend_for(vec![SampleInput::new().with("heart_rate", 105)]);
        assert_eq!(recs.advisories(), &[Advisory::HighRestingHeartRate]);

        let recs = recommend_for(vec![
            SampleInput::new().with("heart_rate", 60),
            SampleInput::new().with("heart_rate", 100),
        ]);
        assert!(recs.is_empty());
    }

    #[test]
    fn test_rules_use_last_not_average() {
        let recs = recommend_for(vec![
            SampleInput::new().with("heart_rate", 140),
            SampleInput::new().with("heart_rate", 140),
            SampleInput::new().with("heart_rate", 70),
        ]);
        assert!(recs.is_empty());
    }

    #[test]
    fn test_partial_cholesterol_yields_nothing() {
        let recs = recommend_for(vec![SampleInput::new()
            .with("cholesterol_total", 300.0)
            .with("cholesterol_ldl", 200.0)]);
        assert!(recs.is_empty());
    }

    #[test]
    fn test_full_cholesterol_panel() {
        let recs = recommend_for(vec![SampleInput::new()
            .with("cholesterol_total", 260.0)
            .with("cholesterol_hdl", 35.0)
            .with("cholesterol_ldl", 170.0)]);
        assert_eq!(
            recs.advisories(),
            &[
                Advisory::HighTotalCholesterol,
                Advisory::LowHdlCholesterol,
                Advisory::HighLdlCholesterol
            ]
        );
    }

    #[test]
    fn test_evaluation_order() {
        let recs = recommend_for(vec![SampleInput::new()
            .with("exercise_minutes", 30)
            .with("blood_sugar", 140.0)
            .with("weight", 50.0)
            .with("height", 1.80)
            .with("heart_rate", 110)]);
        assert_eq!(
            recs.advisories(),
            &[
                Advisory::HighRestingHeartRate,
                Advisory::Underweight,
                Advisory::HighBloodSugar,
                Advisory::InsufficientExercise
            ]
        );

        let text = recs.to_string();
        assert!(text.starts_with(RECOMMENDATIONS_HEADING));
        assert_eq!(text.matches('•').count(), 4);
    }

    #[test]
    fn test_custom_thresholds() {
        let engine = RecommendationEngine::new(RecommendationThresholds {
            blood_sugar_high: 100.0,
            ..Default::default()
        });
        let mut store = MetricStore::new();
        store
            .append(SampleInput::new().with("blood_sugar", 110.0))
            .unwrap();
        let recs = engine.recommend(&summarize(&store));
        assert_eq!(recs.advisories(), &[Advisory::HighBloodSugar]);
    }
}
