//! Anomaly Sensor
//!
//! A virtual sensor that flags readings falling outside mean ± 2·std. Readings
//! come from the caller through `extra["sensor_reading"]` or are synthesized
//! uniformly from `[0, 1000]`. Depending on its attributes the sensor keeps
//! anomalous readings in its history and refreshes its statistics from that
//! history after every read.

pub mod attributes;

pub use attributes::SensorAttributes;

use crate::analytics::{AnomalyDetector, DetectorSettings, Reading};
use crate::config::ComponentConfig;
use crate::error::{Error, Result};
use crate::logging::component_span;
use crate::resource::{
    Dependencies, Extra, Model, ModelFamily, Reconfigurable, Resource,
    ResourceCreatorRegistration, ResourceRegistry, Sensor, SensorReadings,
};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, Instrument, Span};

/// Key in `extra` carrying a caller-supplied reading
pub const SENSOR_READING_KEY: &str = "sensor_reading";

/// Inclusive upper bound of synthesized readings
pub const MAX_SYNTHETIC_READING: u32 = 1000;

/// Model identifier: `danielb:sensor:anomalysensor`
pub fn model() -> Model {
    Model::new(ModelFamily::new("danielb", "sensor"), "anomalysensor")
}

/// Register the anomaly sensor factory and validator
pub fn register(registry: &mut ResourceRegistry) -> Result<()> {
    registry.register_resource_creator(
        model(),
        ResourceCreatorRegistration::new(AnomalySensor::new, AnomalySensor::validate),
    )
}

/// Point-in-time view of the detector state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorSnapshot {
    pub mean: f64,
    pub std: f64,
    pub include_anomalies: bool,
    pub update_statistics: bool,
    pub history_len: usize,
}

struct SensorState {
    detector: AnomalyDetector,
    rng: StdRng,
}

/// Anomaly sensor component. All state sits behind one lock so a read never
/// observes a half-refreshed mean/std pair.
pub struct AnomalySensor {
    name: String,
    state: Mutex<SensorState>,
}

impl AnomalySensor {
    /// Factory: build a sensor with its initial configuration applied
    pub fn new(config: &ComponentConfig, _dependencies: &Dependencies) -> Result<Arc<dyn Sensor>> {
        Ok(Arc::new(Self::from_config(config)?))
    }

    /// Validator: check attribute types. The sensor has no dependencies.
    pub fn validate(config: &ComponentConfig) -> Result<Vec<String>> {
        SensorAttributes::parse(&config.attributes)?;
        Ok(Vec::new())
    }

    /// Build a sensor from configuration, with an entropy-seeded generator
    pub fn from_config(config: &ComponentConfig) -> Result<Self> {
        Self::build(config, StdRng::from_entropy())
    }

    /// Build a sensor whose synthesized readings are reproducible
    pub fn with_seed(config: &ComponentConfig, seed: u64) -> Result<Self> {
        Self::build(config, StdRng::seed_from_u64(seed))
    }

    fn build(config: &ComponentConfig, rng: StdRng) -> Result<Self> {
        let attributes = SensorAttributes::parse(&config.attributes)?;
        let mut settings = DetectorSettings::default();
        attributes.apply_to(&mut settings);

        info!(
            component = %config.name,
            mean = settings.mean,
            std = settings.std,
            include_anomalies = settings.include_anomalies,
            update_statistics = settings.update_statistics,
            "Created anomaly sensor"
        );

        Ok(Self {
            name: config.name.clone(),
            state: Mutex::new(SensorState {
                detector: AnomalyDetector::new(settings),
                rng,
            }),
        })
    }

    /// Current statistics and history size
    pub async fn snapshot(&self) -> DetectorSnapshot {
        let state = self.state.lock().await;
        let settings = state.detector.settings();
        DetectorSnapshot {
            mean: settings.mean,
            std: settings.std,
            include_anomalies: settings.include_anomalies,
            update_statistics: settings.update_statistics,
            history_len: state.detector.history().len(),
        }
    }

    /// Copy of the retained readings, oldest first
    pub async fn history(&self) -> Vec<f64> {
        self.state.lock().await.detector.history().to_vec()
    }

    async fn lock_state(&self, timeout: Option<Duration>) -> Result<MutexGuard<'_, SensorState>> {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, self.state.lock())
                .await
                .map_err(|_| {
                    Error::Timeout(format!(
                        "{}: sensor busy for longer than {:?}",
                        self.name, limit
                    ))
                }),
            None => Ok(self.state.lock().await),
        }
    }
}

/// Extract the caller-supplied reading, if any, alongside its raw JSON form
fn supplied_reading(extra: Option<&Extra>) -> Result<Option<(Reading, &Value)>> {
    extra
        .and_then(|extra| extra.get(SENSOR_READING_KEY))
        .map(|raw| Reading::from_json(raw).map(|reading| (reading, raw)))
        .transpose()
}

#[async_trait]
impl Resource for AnomalySensor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn close(&self) -> Result<()> {
        let history_len = self.state.lock().await.detector.history().len();
        info!(component = %self.name, history_len, "Closed anomaly sensor");
        Ok(())
    }
}

#[async_trait]
impl Reconfigurable for AnomalySensor {
    async fn reconfigure(
        &self,
        config: &ComponentConfig,
        _dependencies: &Dependencies,
    ) -> Result<()> {
        // Parse before locking so a bad config leaves state untouched
        let attributes = SensorAttributes::parse(&config.attributes)?;

        let mut state = self.state.lock().await;
        attributes.apply_to(state.detector.settings_mut());

        let settings = state.detector.settings();
        info!(
            component = %self.name,
            mean = settings.mean,
            std = settings.std,
            include_anomalies = settings.include_anomalies,
            update_statistics = settings.update_statistics,
            "Reconfigured anomaly sensor"
        );
        Ok(())
    }
}

#[async_trait]
impl Sensor for AnomalySensor {
    async fn get_readings(
        &self,
        extra: Option<&Extra>,
        timeout: Option<Duration>,
    ) -> Result<SensorReadings> {
        let span = component_span(&self.name, "get_readings");

        async move {
            let supplied = supplied_reading(extra)?;

            let mut state = self.lock_state(timeout).await?;
            let (reading, raw) = match supplied {
                Some((reading, raw)) => (reading, Some(raw)),
                None => {
                    let value = state.rng.gen_range(0..=MAX_SYNTHETIC_READING);
                    debug!(value, "Synthesized reading");
                    (Reading::Scalar(f64::from(value)), None)
                }
            };

            let classification = state.detector.classify_and_update(reading);
            Span::current().record("anomaly", classification.anomaly);

            let mut readings = classification.to_readings();
            if let Some(raw) = raw {
                readings.insert("reading".to_string(), raw.clone());
            }
            Ok(readings)
        }
        .instrument(span)
        .await
    }
}
