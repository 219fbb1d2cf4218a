use crate::logging::LogConfig;
use crate::resource::Model;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LogConfig,

    /// Components created at startup
    #[serde(default)]
    pub components: Vec<ComponentConfig>,
}

/// Configuration object handed to a component's validator, factory and
/// reconfigure hook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// Unique resource name within the module
    pub name: String,

    /// Model the component is built from
    pub model: Model,

    /// Loosely typed model-specific attributes
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl ComponentConfig {
    /// Create a configuration with no attributes
    pub fn new(name: impl Into<String>, model: Model) -> Self {
        Self {
            name: name.into(),
            model,
            attributes: Map::new(),
        }
    }

    /// Set one attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Replace all attributes
    pub fn with_attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.attributes = attributes;
        self
    }
}

impl ModuleConfig {
    /// Render a commented sample configuration file
    pub fn sample_toml() -> crate::Result<String> {
        let model = crate::components::anomaly_sensor::model();
        let sample = ModuleConfig {
            logging: LogConfig::default(),
            components: vec![ComponentConfig::new("anomaly-1", model)
                .with_attribute("mean", 500.0)
                .with_attribute("std", 150.0)
                .with_attribute("include_anomalies", false)
                .with_attribute("update_statistics", true)],
        };

        let body = toml::to_string_pretty(&sample)
            .map_err(|e| crate::Error::Internal(format!("failed to render sample config: {}", e)))?;

        Ok(format!(
            r#"# anomaly-sensor configuration
#
# Environment variables override file values, e.g.
#   ANOMALY_SENSOR__LOGGING__LEVEL=debug
#
# [logging]
# level  = trace | debug | info | warn | error
# format = human | json
#
# [[components]]
# name  = unique resource name
# model = namespace:family:name
# [components.attributes]
# mean              = expected mean (float)
# std               = expected standard deviation (float, >= 0)
# include_anomalies = keep anomalous readings in the history (bool)
# update_statistics = recompute mean/std from the history after each read (bool)

{}"#,
            body
        ))
    }
}
