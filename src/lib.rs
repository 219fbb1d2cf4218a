//! # anomaly-sensor
//!
//! A virtual anomaly sensor component for a device-management host runtime.
//!
//! Each reading is flagged as anomalous when it falls outside mean ± 2·std.
//! Depending on its attributes the sensor keeps readings in a history and
//! refreshes its mean and standard deviation from that history. Components
//! are created through a model registry and hosted by a [`Module`].

pub mod analytics;
pub mod components;
pub mod config;
pub mod error;
pub mod logging;
pub mod module;
pub mod resource;

pub use components::AnomalySensor;
pub use config::{ComponentConfig, ModuleConfig};
pub use error::{Error, Result};
pub use module::Module;
pub use resource::{Model, Sensor};
