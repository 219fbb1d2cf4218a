//! Anomaly Detector Implementation
//!
//! Two-sigma classification over a running series with optional retention
//! and statistics refresh.

use super::stats;
use super::types::{Classification, DetectorSettings, Reading};
use tracing::{debug, info};

/// Stateful two-sigma anomaly detector.
///
/// The history grows without bound; statistics refresh recomputes over the
/// full history on every reading.
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    /// Current parameters
    settings: DetectorSettings,
    /// Retained readings, oldest first
    history: Vec<f64>,
}

impl AnomalyDetector {
    /// Create a detector with an empty history
    pub fn new(settings: DetectorSettings) -> Self {
        Self {
            settings,
            history: Vec::new(),
        }
    }

    pub fn settings(&self) -> &DetectorSettings {
        &self.settings
    }

    /// Mutable access for field-level reconfiguration. History is untouched.
    pub fn settings_mut(&mut self) -> &mut DetectorSettings {
        &mut self.settings
    }

    pub fn mean(&self) -> f64 {
        self.settings.mean
    }

    pub fn std(&self) -> f64 {
        self.settings.std
    }

    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// Lower and upper bounds of the normal band
    pub fn bounds(&self) -> (f64, f64) {
        let spread = 2.0 * self.settings.std;
        (self.settings.mean - spread, self.settings.mean + spread)
    }

    /// Strict two-sigma test; values on the boundary are normal
    pub fn is_anomaly(&self, observed: f64) -> bool {
        let (lower, upper) = self.bounds();
        observed > upper || observed < lower
    }

    /// Classify a reading, then apply the retention and refresh policies
    pub fn classify_and_update(&mut self, reading: Reading) -> Classification {
        let observed = reading.observed();
        let anomaly = self.is_anomaly(observed);

        let retained = !anomaly || self.settings.include_anomalies;
        if retained {
            self.history.extend_from_slice(reading.values());
        }

        if self.settings.update_statistics {
            self.refresh_statistics();
        }

        if anomaly {
            info!(
                observed = observed,
                mean = self.settings.mean,
                std = self.settings.std,
                retained = retained,
                "Anomalous reading"
            );
        } else {
            debug!(observed = observed, retained = retained, "Normal reading");
        }

        Classification {
            anomaly,
            reading,
            retained,
        }
    }

    /// Recompute mean and population std over the whole history.
    /// An empty history keeps the current values.
    fn refresh_statistics(&mut self) {
        if let (Some(mean), Some(std)) = (
            stats::mean(&self.history),
            stats::population_std(&self.history),
        ) {
            self.settings.mean = mean;
            self.settings.std = std;
        }
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(DetectorSettings::default())
    }
}
