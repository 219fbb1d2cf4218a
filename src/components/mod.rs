//! Components provided by this crate

pub mod anomaly_sensor;

pub use anomaly_sensor::AnomalySensor;

use crate::resource::ResourceRegistry;
use tracing::warn;

/// Register every built-in model. Models already present are left as they are.
pub fn register_builtin_models(registry: &mut ResourceRegistry) {
    if let Err(e) = anomaly_sensor::register(registry) {
        warn!("Skipping anomaly sensor registration: {}", e);
    }
}
