//! Typed view of the anomaly sensor's configuration attributes

use crate::analytics::DetectorSettings;
use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};

/// Attribute keys
pub const MEAN: &str = "mean";
pub const STD: &str = "std";
pub const INCLUDE_ANOMALIES: &str = "include_anomalies";
pub const UPDATE_STATISTICS: &str = "update_statistics";

/// Parsed attributes. `None` means the key was absent and the current value
/// must be kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SensorAttributes {
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub include_anomalies: Option<bool>,
    pub update_statistics: Option<bool>,
}

impl SensorAttributes {
    /// Validate and parse an attribute map. Unknown keys are ignored.
    pub fn parse(attributes: &Map<String, Value>) -> Result<Self> {
        let parsed = Self {
            mean: number_field(attributes, MEAN, "Mean must be a float")?,
            std: number_field(attributes, STD, "Standard deviation must be a float")?,
            include_anomalies: bool_field(
                attributes,
                INCLUDE_ANOMALIES,
                "Include anomalies must be a bool",
            )?,
            update_statistics: bool_field(
                attributes,
                UPDATE_STATISTICS,
                "Update statistics must be a bool",
            )?,
        };

        if let Some(std) = parsed.std {
            if std < 0.0 {
                return Err(Error::configuration(
                    STD,
                    format!("Standard deviation must be non-negative, got {}", std),
                ));
            }
        }

        Ok(parsed)
    }

    /// Overwrite only the fields that were present
    pub fn apply_to(&self, settings: &mut DetectorSettings) {
        if let Some(mean) = self.mean {
            settings.mean = mean;
        }
        if let Some(std) = self.std {
            settings.std = std;
        }
        if let Some(include_anomalies) = self.include_anomalies {
            settings.include_anomalies = include_anomalies;
        }
        if let Some(update_statistics) = self.update_statistics {
            settings.update_statistics = update_statistics;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn number_field(attributes: &Map<String, Value>, key: &str, message: &str) -> Result<Option<f64>> {
    match attributes.get(key) {
        None => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| Error::configuration(key, message)),
        Some(_) => Err(Error::configuration(key, message)),
    }
}

fn bool_field(attributes: &Map<String, Value>, key: &str, message: &str) -> Result<Option<bool>> {
    match attributes.get(key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(Error::configuration(key, message)),
    }
}
