//! Resource Capability Interfaces
//!
//! Traits a component implements so the host can construct, reconfigure,
//! read and close it.

pub mod model;
pub mod registry;

pub use model::{Model, ModelFamily};
pub use registry::{
    Constructor, ResourceCreatorRegistration, ResourceRegistry, Validator,
};

use crate::config::ComponentConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Extra parameters passed alongside a read
pub type Extra = serde_json::Map<String, serde_json::Value>;

/// Output of a sensor read
pub type SensorReadings = serde_json::Map<String, serde_json::Value>;

/// Resolved dependencies keyed by resource name
pub type Dependencies = HashMap<String, Arc<dyn Sensor>>;

/// Base capability shared by every resource
#[async_trait]
pub trait Resource: Send + Sync {
    /// Resource name from its configuration
    fn name(&self) -> &str;

    /// Release the resource. Called once by the host before it is dropped.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Resources that accept configuration updates in place
#[async_trait]
pub trait Reconfigurable: Resource {
    async fn reconfigure(&self, config: &ComponentConfig, dependencies: &Dependencies)
        -> Result<()>;
}

/// Sensor API: returns a map of named readings
#[async_trait]
pub trait Sensor: Reconfigurable {
    async fn get_readings(
        &self,
        extra: Option<&Extra>,
        timeout: Option<Duration>,
    ) -> Result<SensorReadings>;
}
