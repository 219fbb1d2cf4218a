//! Anomaly Detection Types
//!
//! Readings, detector settings and classification results.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Largest magnitude at which every integer is exactly representable as `f64`
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A single reading or a batch of readings observed together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Scalar(f64),
    Batch(Vec<f64>),
}

impl Reading {
    /// Parse a caller-supplied JSON value.
    ///
    /// Numbers become scalars and non-empty arrays of numbers become batches.
    /// Anything else is rejected with [`Error::InvalidInput`].
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .map(Reading::Scalar)
                .ok_or_else(|| Error::InvalidInput(format!("sensor_reading {} is not finite", n))),
            Value::Array(items) => {
                if items.is_empty() {
                    return Err(Error::InvalidInput(
                        "sensor_reading batch must not be empty".to_string(),
                    ));
                }
                let values = items
                    .iter()
                    .map(|item| {
                        item.as_f64().ok_or_else(|| {
                            Error::InvalidInput(format!(
                                "sensor_reading batch element {} must be a number",
                                item
                            ))
                        })
                    })
                    .collect::<Result<Vec<f64>>>()?;
                Ok(Reading::Batch(values))
            }
            other => Err(Error::InvalidInput(format!(
                "sensor_reading must be a number or a list of numbers, got {}",
                other
            ))),
        }
    }

    /// Arithmetic mean of the reading (identity for a scalar)
    pub fn observed(&self) -> f64 {
        match self {
            Reading::Scalar(v) => *v,
            Reading::Batch(values) => values.iter().sum::<f64>() / values.len() as f64,
        }
    }

    /// The individual values carried by the reading
    pub fn values(&self) -> &[f64] {
        match self {
            Reading::Scalar(v) => std::slice::from_ref(v),
            Reading::Batch(values) => values,
        }
    }

    /// Render the reading for the sensor output map.
    ///
    /// Integral values are reported as JSON integers. Used for synthesized
    /// readings; the sensor echoes caller-supplied values as given.
    pub fn to_json(&self) -> Value {
        match self {
            Reading::Scalar(v) => number_to_json(*v),
            Reading::Batch(values) => Value::Array(values.iter().copied().map(number_to_json).collect()),
        }
    }
}

impl From<f64> for Reading {
    fn from(value: f64) -> Self {
        Reading::Scalar(value)
    }
}

impl From<Vec<f64>> for Reading {
    fn from(values: Vec<f64>) -> Self {
        Reading::Batch(values)
    }
}

fn number_to_json(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < MAX_EXACT_INTEGER {
        Value::from(v as i64)
    } else {
        Value::from(v)
    }
}

/// Detector parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorSettings {
    /// Expected mean of the series
    pub mean: f64,
    /// Expected standard deviation of the series
    pub std: f64,
    /// Retain anomalous readings in the history
    pub include_anomalies: bool,
    /// Recompute mean/std from the history after each reading
    pub update_statistics: bool,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            mean: 0.0,
            std: 1.0,
            include_anomalies: false,
            update_statistics: false,
        }
    }
}

/// Result of classifying one reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Whether the reading fell outside mean ± 2·std
    pub anomaly: bool,
    /// The reading as observed, retained or not
    pub reading: Reading,
    /// Whether the reading was appended to the history
    #[serde(skip)]
    pub retained: bool,
}

impl Classification {
    /// Sensor output map: `{"anomaly": 0|1, "reading": ...}`
    pub fn to_readings(&self) -> serde_json::Map<String, Value> {
        let mut readings = serde_json::Map::new();
        readings.insert("anomaly".to_string(), Value::from(u8::from(self.anomaly)));
        readings.insert("reading".to_string(), self.reading.to_json());
        readings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reading_from_number() {
        assert_eq!(Reading::from_json(&json!(10)).unwrap(), Reading::Scalar(10.0));
        assert_eq!(Reading::from_json(&json!(2.5)).unwrap(), Reading::Scalar(2.5));
    }

    #[test]
    fn test_reading_from_batch() {
        let reading = Reading::from_json(&json!([1, 2.0, 3])).unwrap();
        assert_eq!(reading, Reading::Batch(vec![1.0, 2.0, 3.0]));
        assert_eq!(reading.observed(), 2.0);
        assert_eq!(reading.values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_reading_rejects_non_numeric() {
        for value in [json!("not a number"), json!(true), json!(null), json!({"v": 1})] {
            let err = Reading::from_json(&value).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "{:?}", value);
        }
    }

    #[test]
    fn test_reading_rejects_bad_batches() {
        assert!(matches!(
            Reading::from_json(&json!([])),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            Reading::from_json(&json!([1, "two"])),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_to_json_keeps_integers_integral() {
        assert_eq!(Reading::Scalar(10.0).to_json(), json!(10));
        assert_eq!(Reading::Scalar(0.5).to_json(), json!(0.5));
        assert_eq!(Reading::Batch(vec![1.0, 1.5]).to_json(), json!([1, 1.5]));
    }

    #[test]
    fn test_classification_readings_map() {
        let classification = Classification {
            anomaly: true,
            reading: Reading::Scalar(10.0),
            retained: false,
        };
        let readings = classification.to_readings();
        assert_eq!(readings.get("anomaly"), Some(&json!(1)));
        assert_eq!(readings.get("reading"), Some(&json!(10)));
        assert_eq!(readings.len(), 2);
    }
}
