//! Append-only metric store.
//!
//! Samples are kept in insertion (chronological) order. There is no update
//! or delete: corrections are made by appending a new sample. A per-field
//! index of the most recent sample carrying each field keeps last-value
//! lookups constant time.

use crate::core::sample::{MetricField, MetricSample, MetricValue, SampleInput, ValidationError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Ordered collection of recorded samples.
#[derive(Debug, Clone, Default)]
pub struct MetricStore {
    /// Samples in insertion order
    samples: Vec<MetricSample>,
    /// Index of the latest sample that populated each field
    latest: HashMap<MetricField, usize>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a sample stamped with the current time.
    pub fn append(&mut self, input: SampleInput) -> Result<&MetricSample, ValidationError> {
        let sample = self.prepare(input, Utc::now())?;
        Ok(self.commit(sample))
    }

    /// Validate a sample and stamp it without touching the store.
    ///
    /// The timestamp is clamped to the latest stored timestamp so that
    /// timestamps never decrease across appends.
    pub fn prepare(
        &self,
        input: SampleInput,
        at: DateTime<Utc>,
    ) -> Result<MetricSample, ValidationError> {
        let values = input.into_values()?;
        Ok(MetricSample::new(self.clamp(at), values))
    }

    /// Push an already validated sample.
    pub(crate) fn commit(&mut self, mut sample: MetricSample) -> &MetricSample {
        sample.timestamp = self.clamp(sample.timestamp);

        let index = self.samples.len();
        for field in sample.fields() {
            self.latest.insert(field, index);
        }
        self.samples.push(sample);
        &self.samples[index]
    }

    /// Re-insert a sample read back from a journal, keeping its timestamp.
    ///
    /// The sample is checked against the schema first; an invalid sample is
    /// rejected and the store is left untouched.
    pub fn restore(&mut self, sample: MetricSample) -> Result<(), ValidationError> {
        if sample.is_empty() {
            tracing::warn!(timestamp = %sample.timestamp, "Skipping empty journaled sample");
            return Ok(());
        }
        sample.validate()?;
        self.commit(sample);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Read-only view of every sample in insertion order.
    ///
    /// The iterator is `Clone`, so it can be restarted freely.
    pub fn all_samples(&self) -> std::slice::Iter<'_, MetricSample> {
        self.samples.iter()
    }

    pub fn latest_sample(&self) -> Option<&MetricSample> {
        self.samples.last()
    }

    /// Value of `field` from the most recent sample where it is present.
    ///
    /// `None` means the field was never recorded.
    pub fn latest_value(&self, field: MetricField) -> Option<MetricValue> {
        self.latest
            .get(&field)
            .and_then(|&index| self.samples[index].get(field))
    }

    /// All present values of `field` in insertion order.
    pub fn values_of(&self, field: MetricField) -> impl Iterator<Item = MetricValue> + '_ {
        self.samples.iter().filter_map(move |sample| sample.get(field))
    }

    /// Fields that appear in at least one sample, in display order.
    pub fn observed_fields(&self) -> Vec<MetricField> {
        let mut fields: Vec<MetricField> = self.latest.keys().copied().collect();
        fields.sort();
        fields
    }

    fn clamp(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        match self.samples.last() {
            Some(last) if last.timestamp > at => last.timestamp,
            _ => at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sample::BloodPressure;
    use chrono::Duration;

    #[test]
    fn test_empty_store() {
        let store = MetricStore::new();
        assert!(store.is_empty());
        assert_eq!(store.all_samples().count(), 0);
        assert_eq!(store.latest_value(MetricField::HeartRate), None);
    }

    #[test]
    fn test_latest_value_survives_omitting_samples() {
        let mut store = MetricStore::new();
        store
            .append(SampleInput::new().with("heart_rate", 75))
            .unwrap();
        store
            .append(SampleInput::new().with("weight", 82.0))
            .unwrap();

        assert_eq!(
            store.latest_value(MetricField::HeartRate),
            Some(MetricValue::Number(75.0))
        );
        assert_eq!(
            store.latest_value(MetricField::Weight),
            Some(MetricValue::Number(82.0))
        );

        store
            .append(SampleInput::new().with("heart_rate", 68))
            .unwrap();
        assert_eq!(
            store.latest_value(MetricField::HeartRate),
            Some(MetricValue::Number(68.0))
        );
    }

    #[test]
    fn test_bmi_never_back_filled() {
        let mut store = MetricStore::new();
        store
            .append(SampleInput::new().with("weight", 70.0))
            .unwrap();
        store
            .append(SampleInput::new().with("height", 1.75).with("weight", 70.0))
            .unwrap();

        let samples: Vec<_> = store.all_samples().collect();
        assert!(!samples[0].contains(MetricField::Bmi));
        assert!(samples[1].contains(MetricField::Bmi));
    }

    #[test]
    fn test_invalid_sample_leaves_store_untouched() {
        let mut store = MetricStore::new();
        let err = store
            .append(SampleInput::new().with("blood_pressure", "abc"))
            .unwrap_err();
        assert!(matches!(err, ValidationError::MalformedBloodPressure(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_timestamps_never_decrease() {
        let mut store = MetricStore::new();
        let now = Utc::now();

        let first = store
            .prepare(SampleInput::new().with("heart_rate", 70), now)
            .unwrap();
        store.commit(first);

        let earlier = store
            .prepare(
                SampleInput::new().with("heart_rate", 71),
                now - Duration::minutes(5),
            )
            .unwrap();
        let committed = store.commit(earlier);
        assert_eq!(committed.timestamp, now);

        let timestamps: Vec<_> = store.all_samples().map(|s| s.timestamp).collect();
        assert!(timestamps.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_all_samples_restartable() {
        let mut store = MetricStore::new();
        for hr in [60, 70, 80] {
            store
                .append(SampleInput::new().with("heart_rate", hr))
                .unwrap();
        }

        let iter = store.all_samples();
        let first_pass: Vec<_> = iter.clone().filter_map(|s| s.number(MetricField::HeartRate)).collect();
        let second_pass: Vec<_> = iter.filter_map(|s| s.number(MetricField::HeartRate)).collect();
        assert_eq!(first_pass, vec![60.0, 70.0, 80.0]);
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn test_restore_rejects_mistyped_values() {
        let mut store = MetricStore::new();
        let mut values = std::collections::BTreeMap::new();
        values.insert(
            MetricField::HeartRate,
            MetricValue::BloodPressure(BloodPressure::new(190, 130)),
        );
        let bad = MetricSample::new(Utc::now(), values);

        assert_eq!(
            store.restore(bad),
            Err(ValidationError::WrongKind { field: "heart_rate" })
        );
        assert!(store.is_empty());
        assert_eq!(store.latest_value(MetricField::HeartRate), None);

        let good = store
            .prepare(SampleInput::new().with("heart_rate", 64), Utc::now())
            .unwrap();
        store.restore(good).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_observed_fields_in_display_order() {
        let mut store = MetricStore::new();
        store
            .append(SampleInput::new().with("exercise_minutes", 30))
            .unwrap();
        store
            .append(
                SampleInput::new()
                    .with("blood_pressure", BloodPressure::new(120, 80))
                    .with("heart_rate", 72),
            )
            .unwrap();

        assert_eq!(
            store.observed_fields(),
            vec![
                MetricField::HeartRate,
                MetricField::BloodPressure,
                MetricField::ExerciseMinutes
            ]
        );
    }
}
