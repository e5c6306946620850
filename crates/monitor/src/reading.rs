use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A live sensor reading: canonical variable name to measured value.
///
/// Deserialized from a flat JSON object such as
/// `{"Amperagem_Peletizadora": 645.0, "Taxa_Compressao": 18.9}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorReading(BTreeMap<String, f64>);

impl SensorReading {
    /// Empty reading
    pub fn new() -> SensorReading {
        SensorReading::default()
    }

    /// Add (or replace) the value of `variable`
    pub fn with(mut self, variable: &str, value: f64) -> Self {
        self.insert(variable, value);
        self
    }

    /// Set the value of `variable`
    pub fn insert(&mut self, variable: &str, value: f64) {
        self.0.insert(variable.to_string(), value);
    }

    /// Value of `variable`, a `NaN` value counts as not provided
    pub fn get(&self, variable: &str) -> Option<f64> {
        self.0.get(variable).copied().filter(|v| !v.is_nan())
    }

    /// Variables and values in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }

    /// Number of provided variables
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was provided
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for SensorReading {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        SensorReading(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, f64>> for SensorReading {
    fn from(values: BTreeMap<String, f64>) -> Self {
        SensorReading(values)
    }
}
