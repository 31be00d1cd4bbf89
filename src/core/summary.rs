//! Statistical rollup of the metric store.
//!
//! For every field observed at least once, the summary carries the mean,
//! minimum and maximum over all present values plus the most recent value.
//! Missing entries are ignored, never treated as zero, and fields that were
//! never recorded are omitted entirely.

use crate::core::sample::{BloodPressure, MetricField, MetricValue};
use crate::core::store::MetricStore;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Mean, minimum and maximum over a set of values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

impl AxisStats {
    /// `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        Some(Self {
            average: values.iter().mean(),
            min: Statistics::min(values.iter()),
            max: Statistics::max(values.iter()),
        })
    }
}

/// Rollup of a plain numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub last: f64,
    pub count: usize,
}

/// Rollup of blood pressure, per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloodPressureSummary {
    pub systolic: AxisStats,
    pub diastolic: AxisStats,
    pub last: BloodPressure,
    pub count: usize,
}

/// Statistics for one summarized field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSummary {
    Numeric(NumericSummary),
    BloodPressure(BloodPressureSummary),
}

impl FieldSummary {
    pub fn last(&self) -> MetricValue {
        match self {
            FieldSummary::Numeric(s) => MetricValue::Number(s.last),
            FieldSummary::BloodPressure(s) => MetricValue::BloodPressure(s.last),
        }
    }

    pub fn last_number(&self) -> Option<f64> {
        self.last().as_number()
    }

    pub fn count(&self) -> usize {
        match self {
            FieldSummary::Numeric(s) => s.count,
            FieldSummary::BloodPressure(s) => s.count,
        }
    }
}

/// Per-field rollup over the whole store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Summary {
    fields: BTreeMap<MetricField, FieldSummary>,
}

impl Summary {
    pub fn get(&self, field: MetricField) -> Option<&FieldSummary> {
        self.fields.get(&field)
    }

    /// Latest numeric value of `field`, if it was ever recorded.
    pub fn last_number(&self, field: MetricField) -> Option<f64> {
        self.get(field).and_then(FieldSummary::last_number)
    }

    pub fn contains(&self, field: MetricField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Summarized fields in display order.
    pub fn iter(&self) -> impl Iterator<Item = (MetricField, &FieldSummary)> {
        self.fields.iter().map(|(field, summary)| (*field, summary))
    }
}

/// Reduce the store into a [`Summary`].
pub fn summarize(store: &MetricStore) -> Summary {
    let mut fields = BTreeMap::new();

    for field in store.observed_fields() {
        let Some(last) = store.latest_value(field) else {
            continue;
        };

        let summary = match last {
            MetricValue::Number(last) => {
                let values: Vec<f64> = store
                    .values_of(field)
                    .filter_map(|v| v.as_number())
                    .collect();
                AxisStats::from_values(&values).map(|stats| {
                    FieldSummary::Numeric(NumericSummary {
                        average: stats.average,
                        min: stats.min,
                        max: stats.max,
                        last,
                        count: values.len(),
                    })
                })
            }
            MetricValue::BloodPressure(last) => {
                let readings: Vec<BloodPressure> = store
                    .values_of(field)
                    .filter_map(|v| v.as_blood_pressure())
                    .collect();
                let systolic: Vec<f64> = readings.iter().map(|bp| f64::from(bp.systolic)).collect();
                let diastolic: Vec<f64> =
                    readings.iter().map(|bp| f64::from(bp.diastolic)).collect();
                AxisStats::from_values(&systolic)
                    .zip(AxisStats::from_values(&diastolic))
                    .map(|(systolic, diastolic)| {
                        FieldSummary::BloodPressure(BloodPressureSummary {
                            systolic,
                            diastolic,
                            last,
                            count: readings.len(),
                        })
                    })
            }
        };

        if let Some(summary) = summary {
            fields.insert(field, summary);
        }
    }

    Summary { fields }
}
