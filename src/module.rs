//! Module Host
//!
//! In-process host for registered components: validates configurations,
//! constructs components through the registry, forwards reconfiguration and
//! reads, and closes everything on shutdown.

use crate::config::ComponentConfig;
use crate::error::{Error, Result};
use crate::resource::registry::{self, ResourceRegistry};
use crate::resource::{Dependencies, Extra, Model, Sensor, SensorReadings};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Module lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Models are being added, components may be created
    Initializing,
    /// Serving reads
    Running,
    /// Closing components
    Stopping,
    /// All components closed
    Stopped,
}

/// Read counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadMetrics {
    pub reads_total: u64,
    pub reads_failed: u64,
    pub anomalies: u64,
}

struct ManagedResource {
    model: Model,
    sensor: Arc<dyn Sensor>,
}

/// Hosts components built from registered models
pub struct Module {
    /// Registered creators available to this module
    registry: ResourceRegistry,
    /// Models this module serves
    models: RwLock<HashSet<Model>>,
    /// Live components by name
    resources: RwLock<HashMap<String, ManagedResource>>,
    /// Current lifecycle state
    state: RwLock<ModuleState>,
    /// Read counters
    metrics: RwLock<ReadMetrics>,
}

impl Module {
    /// Create a module backed by `registry`
    pub fn new(registry: ResourceRegistry) -> Self {
        Self {
            registry,
            models: RwLock::new(HashSet::new()),
            resources: RwLock::new(HashMap::new()),
            state: RwLock::new(ModuleState::Initializing),
            metrics: RwLock::new(ReadMetrics::default()),
        }
    }

    /// Create a module backed by a copy of the process-wide registry
    pub fn from_global() -> Result<Self> {
        Ok(Self::new(registry::global_snapshot()?))
    }

    /// Serve `model`, which must already be registered
    pub async fn add_model_from_registry(&self, model: &Model) -> Result<()> {
        if !self.registry.contains(model) {
            return Err(Error::ModelNotFound(model.to_string()));
        }
        info!(model = %model, "Adding model from registry");
        self.models.write().await.insert(model.clone());
        Ok(())
    }

    /// Models this module serves, sorted
    pub async fn models(&self) -> Vec<Model> {
        let mut models: Vec<Model> = self.models.read().await.iter().cloned().collect();
        models.sort();
        models
    }

    /// Mark the module as serving
    pub async fn start(&self) -> Result<()> {
        let mut state = self.state.write().await;
        match *state {
            ModuleState::Initializing => {
                *state = ModuleState::Running;
                info!("Module started");
                Ok(())
            }
            ModuleState::Running => {
                warn!("Module already running");
                Ok(())
            }
            other => Err(Error::Internal(format!("cannot start module in state {:?}", other))),
        }
    }

    /// Validate `config` and create the component it describes
    pub async fn add_resource(&self, config: &ComponentConfig) -> Result<()> {
        self.ensure_accepting().await?;
        if self.resources.read().await.contains_key(&config.name) {
            return Err(Error::ResourceExists(config.name.clone()));
        }

        let sensor = self.build_resource(config).await?;

        let mut resources = self.resources.write().await;
        if resources.contains_key(&config.name) {
            // Lost a race with a concurrent add of the same name
            drop(resources);
            if let Err(e) = sensor.close().await {
                warn!(component = %config.name, "Failed to close duplicate component: {}", e);
            }
            return Err(Error::ResourceExists(config.name.clone()));
        }
        resources.insert(
            config.name.clone(),
            ManagedResource {
                model: config.model.clone(),
                sensor,
            },
        );

        info!(component = %config.name, model = %config.model, "Added component");
        Ok(())
    }

    /// Apply a new configuration to an existing component.
    ///
    /// A model change replaces the component; otherwise the update is applied
    /// in place and the component keeps its state.
    pub async fn reconfigure_resource(&self, config: &ComponentConfig) -> Result<()> {
        self.ensure_accepting().await?;

        let (current_model, sensor) = {
            let resources = self.resources.read().await;
            let managed = resources
                .get(&config.name)
                .ok_or_else(|| Error::ResourceNotFound(config.name.clone()))?;
            (managed.model.clone(), Arc::clone(&managed.sensor))
        };

        if current_model != config.model {
            info!(
                component = %config.name,
                from = %current_model,
                to = %config.model,
                "Model changed, rebuilding component"
            );
            // Build first so a bad config leaves the old component serving
            let replacement = self.build_resource(config).await?;
            self.resources.write().await.insert(
                config.name.clone(),
                ManagedResource {
                    model: config.model.clone(),
                    sensor: replacement,
                },
            );
            return sensor.close().await;
        }

        let registration = self.registry.lookup(&config.model)?;
        let required = (registration.validator)(config)?;
        let dependencies = self.resolve_dependencies(&required).await?;
        sensor.reconfigure(config, &dependencies).await
    }

    /// Close and drop a component
    pub async fn remove_resource(&self, name: &str) -> Result<()> {
        let managed = self
            .resources
            .write()
            .await
            .remove(name)
            .ok_or_else(|| Error::ResourceNotFound(name.to_string()))?;

        info!(component = %name, "Removing component");
        managed.sensor.close().await
    }

    /// Read from a component
    pub async fn get_readings(
        &self,
        name: &str,
        extra: Option<&Extra>,
        timeout: Option<Duration>,
    ) -> Result<SensorReadings> {
        let sensor = self
            .resource(name)
            .await
            .ok_or_else(|| Error::ResourceNotFound(name.to_string()))?;

        let result = sensor.get_readings(extra, timeout).await;

        let mut metrics = self.metrics.write().await;
        metrics.reads_total += 1;
        match &result {
            Ok(readings) => {
                if readings.get("anomaly").and_then(|v| v.as_u64()) == Some(1) {
                    metrics.anomalies += 1;
                }
            }
            Err(e) => {
                metrics.reads_failed += 1;
                debug!(component = %name, "Read failed: {}", e);
            }
        }

        result
    }

    /// Look up a live component
    pub async fn resource(&self, name: &str) -> Option<Arc<dyn Sensor>> {
        self.resources
            .read()
            .await
            .get(name)
            .map(|managed| Arc::clone(&managed.sensor))
    }

    /// Names of live components, sorted
    pub async fn resource_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.resources.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Close every component and stop the module
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down module...");
        *self.state.write().await = ModuleState::Stopping;

        let drained: Vec<(String, ManagedResource)> =
            self.resources.write().await.drain().collect();

        let results = join_all(drained.iter().map(|(_, managed)| managed.sensor.close())).await;
        for ((name, _), result) in drained.iter().zip(results) {
            if let Err(e) = result {
                error!(component = %name, "Failed to close component: {}", e);
            }
        }

        *self.state.write().await = ModuleState::Stopped;
        info!("Module shutdown complete");
        Ok(())
    }

    /// Current lifecycle state
    pub async fn state(&self) -> ModuleState {
        *self.state.read().await
    }

    /// Check if the module is serving
    pub async fn is_ready(&self) -> bool {
        matches!(*self.state.read().await, ModuleState::Running)
    }

    /// Current read counters
    pub async fn metrics(&self) -> ReadMetrics {
        *self.metrics.read().await
    }

    async fn ensure_accepting(&self) -> Result<()> {
        match *self.state.read().await {
            ModuleState::Initializing | ModuleState::Running => Ok(()),
            other => Err(Error::Internal(format!("module is {:?}", other))),
        }
    }

    async fn build_resource(&self, config: &ComponentConfig) -> Result<Arc<dyn Sensor>> {
        if !self.models.read().await.contains(&config.model) {
            return Err(Error::ModelNotFound(config.model.to_string()));
        }
        let registration = self.registry.lookup(&config.model)?;
        let required = (registration.validator)(config)?;
        let dependencies = self.resolve_dependencies(&required).await?;
        (registration.constructor)(config, &dependencies)
    }

    async fn resolve_dependencies(&self, names: &[String]) -> Result<Dependencies> {
        let resources = self.resources.read().await;
        names
            .iter()
            .map(|name| {
                resources
                    .get(name)
                    .map(|managed| (name.clone(), Arc::clone(&managed.sensor)))
                    .ok_or_else(|| Error::MissingDependency(name.clone()))
            })
            .collect()
    }
}
