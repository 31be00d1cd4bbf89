//! Metric samples and the closed field schema.
//!
//! A sample is one timestamped set of measurements submitted together.
//! Input arrives as loosely typed field/value pairs ([`SampleInput`]) and is
//! validated against the known field set before it ever reaches the store.
//! Malformed values are rejected here, at ingestion, never at query time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Input-only field used to derive BMI. Never stored on a sample.
pub const HEIGHT_FIELD: &str = "height";

/// Tracked metric fields.
///
/// Declaration order is the canonical display order used by summaries and
/// reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    HeartRate,
    BloodPressure,
    CholesterolTotal,
    CholesterolLdl,
    CholesterolHdl,
    BloodSugar,
    Weight,
    Bmi,
    ExerciseMinutes,
}

impl MetricField {
    /// Every tracked field, in display order.
    pub const ALL: [MetricField; 9] = [
        MetricField::HeartRate,
        MetricField::BloodPressure,
        MetricField::CholesterolTotal,
        MetricField::CholesterolLdl,
        MetricField::CholesterolHdl,
        MetricField::BloodSugar,
        MetricField::Weight,
        MetricField::Bmi,
        MetricField::ExerciseMinutes,
    ];

    /// Wire name (lower_snake_case).
    pub fn name(self) -> &'static str {
        match self {
            MetricField::HeartRate => "heart_rate",
            MetricField::BloodPressure => "blood_pressure",
            MetricField::CholesterolTotal => "cholesterol_total",
            MetricField::CholesterolLdl => "cholesterol_ldl",
            MetricField::CholesterolHdl => "cholesterol_hdl",
            MetricField::BloodSugar => "blood_sugar",
            MetricField::Weight => "weight",
            MetricField::Bmi => "bmi",
            MetricField::ExerciseMinutes => "exercise_minutes",
        }
    }

    /// Human readable label for reports.
    pub fn label(self) -> &'static str {
        match self {
            MetricField::HeartRate => "Heart Rate",
            MetricField::BloodPressure => "Blood Pressure",
            MetricField::CholesterolTotal => "Cholesterol Total",
            MetricField::CholesterolLdl => "Cholesterol LDL",
            MetricField::CholesterolHdl => "Cholesterol HDL",
            MetricField::BloodSugar => "Blood Sugar",
            MetricField::Weight => "Weight",
            MetricField::Bmi => "BMI",
            MetricField::ExerciseMinutes => "Exercise Minutes",
        }
    }

    /// Unit of measurement.
    pub fn unit(self) -> &'static str {
        match self {
            MetricField::HeartRate => "bpm",
            MetricField::BloodPressure => "mmHg",
            MetricField::CholesterolTotal
            | MetricField::CholesterolLdl
            | MetricField::CholesterolHdl
            | MetricField::BloodSugar => "mg/dL",
            MetricField::Weight => "kg",
            MetricField::Bmi => "kg/m²",
            MetricField::ExerciseMinutes => "min",
        }
    }

    /// Whether the field is computed by the store rather than recorded.
    pub fn is_derived(self) -> bool {
        matches!(self, MetricField::Bmi)
    }

    fn is_integer(self) -> bool {
        matches!(self, MetricField::HeartRate | MetricField::ExerciseMinutes)
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricField::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| ValidationError::UnknownField(s.to_string()))
    }
}

/// A blood pressure reading, `systolic/diastolic` in mmHg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BloodPressure {
    pub systolic: u32,
    pub diastolic: u32,
}

impl BloodPressure {
    pub fn new(systolic: u32, diastolic: u32) -> Self {
        Self {
            systolic,
            diastolic,
        }
    }
}

impl FromStr for BloodPressure {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ValidationError::MalformedBloodPressure(s.to_string());
        let (systolic, diastolic) = s.trim().split_once('/').ok_or_else(malformed)?;
        let systolic = systolic.trim().parse::<u32>().map_err(|_| malformed())?;
        let diastolic = diastolic.trim().parse::<u32>().map_err(|_| malformed())?;
        Ok(Self::new(systolic, diastolic))
    }
}

impl TryFrom<String> for BloodPressure {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BloodPressure> for String {
    fn from(bp: BloodPressure) -> Self {
        bp.to_string()
    }
}

impl fmt::Display for BloodPressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.systolic, self.diastolic)
    }
}

/// A validated, stored metric value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    BloodPressure(BloodPressure),
}

impl MetricValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => Some(*n),
            MetricValue::BloodPressure(_) => None,
        }
    }

    pub fn as_blood_pressure(&self) -> Option<BloodPressure> {
        match self {
            MetricValue::BloodPressure(bp) => Some(*bp),
            MetricValue::Number(_) => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(n) => write!(f, "{n}"),
            MetricValue::BloodPressure(bp) => write!(f, "{bp}"),
        }
    }
}

/// A raw, not yet validated field value as submitted by a collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<BloodPressure> for FieldValue {
    fn from(value: BloodPressure) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// Errors raised while validating a submitted sample.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("unknown metric field '{0}'")]
    UnknownField(String),

    #[error("'{0}' is derived and cannot be recorded directly")]
    DerivedField(&'static str),

    #[error("malformed blood pressure '{0}': expected systolic/diastolic integers such as 120/80")]
    MalformedBloodPressure(String),

    #[error("{field} must be a number, got '{value}'")]
    NotANumber { field: String, value: String },

    #[error("{field} must be a finite number")]
    NonFinite { field: String },

    #[error("{field} cannot be negative (got {value})")]
    Negative { field: String, value: f64 },

    #[error("{field} must be a whole number (got {value})")]
    NotAnInteger { field: String, value: f64 },

    #[error("height must be greater than zero to derive BMI")]
    InvalidHeight,

    #[error("sample contains no trackable metrics")]
    EmptySample,

    #[error("expected key=value, got '{0}'")]
    MalformedPair(String),

    #[error("{field} holds a value of the wrong kind")]
    WrongKind { field: &'static str },

    #[error("bmi is present without the weight it was derived from")]
    BmiWithoutWeight,
}

/// Field/value pairs submitted for one sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleInput {
    fields: BTreeMap<String, FieldValue>,
}

impl SampleInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse `key=value` pairs, e.g. `heart_rate=72 blood_pressure=120/80`.
    ///
    /// Values that parse as numbers become [`FieldValue::Number`]; anything
    /// else is kept as text and validated per field later.
    pub fn parse_pairs<I, S>(pairs: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut input = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| ValidationError::MalformedPair(pair.to_string()))?;
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() {
                return Err(ValidationError::MalformedPair(pair.to_string()));
            }
            match value.parse::<f64>() {
                Ok(n) => input.insert(key, n),
                Err(_) => input.insert(key, value),
            }
        }
        Ok(input)
    }

    /// Validate against the schema and derive computed fields.
    pub(crate) fn into_values(self) -> Result<BTreeMap<MetricField, MetricValue>, ValidationError> {
        let mut values = BTreeMap::new();
        let mut height = None;

        for (name, raw) in &self.fields {
            let name = name.trim();
            if name == HEIGHT_FIELD {
                height = Some(parse_measurement(HEIGHT_FIELD, raw, false)?);
                continue;
            }

            let field: MetricField = name.parse()?;
            if field.is_derived() {
                return Err(ValidationError::DerivedField(field.name()));
            }

            let value = match field {
                MetricField::BloodPressure => MetricValue::BloodPressure(parse_blood_pressure(raw)?),
                _ => MetricValue::Number(parse_measurement(field.name(), raw, field.is_integer())?),
            };
            values.insert(field, value);
        }

        let weight = values
            .get(&MetricField::Weight)
            .and_then(MetricValue::as_number);
        if let (Some(weight), Some(height)) = (weight, height) {
            values.insert(MetricField::Bmi, MetricValue::Number(bmi(weight, height)?));
        } else if height.is_some() {
            tracing::debug!("height recorded without weight, BMI not derived");
        }

        if values.is_empty() {
            return Err(ValidationError::EmptySample);
        }
        Ok(values)
    }
}

impl<K, V> FromIterator<(K, V)> for SampleInput
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut input = Self::new();
        for (field, value) in iter {
            input.insert(field, value);
        }
        input
    }
}

/// Body mass index: weight (kg) over height (m) squared.
pub fn bmi(weight_kg: f64, height_m: f64) -> Result<f64, ValidationError> {
    if height_m <= 0.0 {
        return Err(ValidationError::InvalidHeight);
    }
    Ok(weight_kg / (height_m * height_m))
}

fn parse_measurement(field: &str, raw: &FieldValue, integer: bool) -> Result<f64, ValidationError> {
    let value = match raw {
        FieldValue::Number(n) => *n,
        FieldValue::Text(s) => s.trim().parse::<f64>().map_err(|_| ValidationError::NotANumber {
            field: field.to_string(),
            value: s.clone(),
        })?,
    };

    check_measurement(field, value, integer)
}

fn check_measurement(field: &str, value: f64, integer: bool) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite {
            field: field.to_string(),
        });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
            value,
        });
    }
    if integer && value.fract() != 0.0 {
        return Err(ValidationError::NotAnInteger {
            field: field.to_string(),
            value,
        });
    }
    Ok(value)
}

fn parse_blood_pressure(raw: &FieldValue) -> Result<BloodPressure, ValidationError> {
    match raw {
        FieldValue::Text(s) => s.parse(),
        FieldValue::Number(n) => Err(ValidationError::MalformedBloodPressure(n.to_string())),
    }
}

/// One recorded observation set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Ingestion time
    pub timestamp: DateTime<Utc>,
    /// Present values keyed by field
    values: BTreeMap<MetricField, MetricValue>,
}

impl MetricSample {
    pub(crate) fn new(timestamp: DateTime<Utc>, values: BTreeMap<MetricField, MetricValue>) -> Self {
        Self { timestamp, values }
    }

    pub fn get(&self, field: MetricField) -> Option<MetricValue> {
        self.values.get(&field).copied()
    }

    pub fn number(&self, field: MetricField) -> Option<f64> {
        self.get(field).and_then(|v| v.as_number())
    }

    pub fn blood_pressure(&self) -> Option<BloodPressure> {
        self.get(MetricField::BloodPressure)
            .and_then(|v| v.as_blood_pressure())
    }

    pub fn contains(&self, field: MetricField) -> bool {
        self.values.contains_key(&field)
    }

    /// Fields present on this sample, in display order.
    pub fn fields(&self) -> impl Iterator<Item = MetricField> + '_ {
        self.values.keys().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = (MetricField, MetricValue)> + '_ {
        self.values.iter().map(|(field, value)| (*field, *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check stored values against the schema.
    ///
    /// Samples built from [`SampleInput`] always pass. Samples deserialized
    /// from elsewhere (a journal) must be checked before they reach a store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in &self.values {
            match (field, value) {
                (MetricField::BloodPressure, MetricValue::BloodPressure(_)) => {}
                (MetricField::BloodPressure, MetricValue::Number(_))
                | (_, MetricValue::BloodPressure(_)) => {
                    return Err(ValidationError::WrongKind {
                        field: field.name(),
                    });
                }
                (_, MetricValue::Number(n)) => {
                    check_measurement(field.name(), *n, field.is_integer())?;
                }
            }
        }
        if self.contains(MetricField::Bmi) && !self.contains(MetricField::Weight) {
            return Err(ValidationError::BmiWithoutWeight);
        }
        Ok(())
    }
}
