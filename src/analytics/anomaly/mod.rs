//! Anomaly Detection Module
//!
//! Two-sigma anomaly detection over a running series

mod detector;
pub mod stats;
mod types;

pub use detector::AnomalyDetector;
pub use types::{Classification, DetectorSettings, Reading};
