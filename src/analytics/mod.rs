//! Analytics Module
//!
//! Anomaly detection over sensor readings

pub mod anomaly;

pub use anomaly::{AnomalyDetector, Classification, DetectorSettings, Reading};
