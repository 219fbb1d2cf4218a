//! Resource Registry
//!
//! Maps model identifiers to the factory and validator that build and check
//! components of that model. A process-wide instance is initialized once with
//! the built-in models.

use super::{Dependencies, Model, Sensor};
use crate::config::ComponentConfig;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};
use tracing::{debug, info};

/// Builds a ready-to-use component from its configuration
pub type Constructor =
    Arc<dyn Fn(&ComponentConfig, &Dependencies) -> Result<Arc<dyn Sensor>> + Send + Sync>;

/// Checks a configuration and returns the names of required dependencies
pub type Validator = Arc<dyn Fn(&ComponentConfig) -> Result<Vec<String>> + Send + Sync>;

/// Factory and validator registered for one model
#[derive(Clone)]
pub struct ResourceCreatorRegistration {
    pub constructor: Constructor,
    pub validator: Validator,
}

impl ResourceCreatorRegistration {
    pub fn new<C, V>(constructor: C, validator: V) -> Self
    where
        C: Fn(&ComponentConfig, &Dependencies) -> Result<Arc<dyn Sensor>> + Send + Sync + 'static,
        V: Fn(&ComponentConfig) -> Result<Vec<String>> + Send + Sync + 'static,
    {
        Self {
            constructor: Arc::new(constructor),
            validator: Arc::new(validator),
        }
    }
}

impl std::fmt::Debug for ResourceCreatorRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCreatorRegistration").finish_non_exhaustive()
    }
}

/// Registry of resource creators keyed by model
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    creators: HashMap<Model, ResourceCreatorRegistration>,
}

impl ResourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every model this crate provides
    pub fn with_builtin_models() -> Self {
        let mut registry = Self::new();
        crate::components::register_builtin_models(&mut registry);
        registry
    }

    /// Register a creator for `model`
    pub fn register_resource_creator(
        &mut self,
        model: Model,
        registration: ResourceCreatorRegistration,
    ) -> Result<()> {
        if self.creators.contains_key(&model) {
            return Err(Error::AlreadyRegistered(model.to_string()));
        }

        info!(model = %model, "Registering resource creator");
        self.creators.insert(model, registration);
        Ok(())
    }

    /// Remove the creator for `model`
    pub fn deregister_resource_creator(&mut self, model: &Model) -> Result<()> {
        self.creators
            .remove(model)
            .map(|_| debug!(model = %model, "Deregistered resource creator"))
            .ok_or_else(|| Error::ModelNotFound(model.to_string()))
    }

    /// Look up the creator for `model`
    pub fn lookup(&self, model: &Model) -> Result<ResourceCreatorRegistration> {
        self.creators
            .get(model)
            .cloned()
            .ok_or_else(|| Error::ModelNotFound(model.to_string()))
    }

    pub fn contains(&self, model: &Model) -> bool {
        self.creators.contains_key(model)
    }

    /// Registered models, sorted
    pub fn models(&self) -> Vec<Model> {
        let mut models: Vec<Model> = self.creators.keys().cloned().collect();
        models.sort();
        models
    }

    pub fn len(&self) -> usize {
        self.creators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }
}

static GLOBAL_REGISTRY: OnceLock<RwLock<ResourceRegistry>> = OnceLock::new();

/// Process-wide registry, seeded with the built-in models on first access
pub fn global() -> &'static RwLock<ResourceRegistry> {
    GLOBAL_REGISTRY.get_or_init(|| RwLock::new(ResourceRegistry::with_builtin_models()))
}

/// Register a creator in the process-wide registry
pub fn register_resource_creator(
    model: Model,
    registration: ResourceCreatorRegistration,
) -> Result<()> {
    global()
        .write()
        .map_err(|_| Error::Internal("resource registry lock poisoned".to_string()))?
        .register_resource_creator(model, registration)
}

/// Look up a creator in the process-wide registry
pub fn lookup_resource_creator(model: &Model) -> Result<ResourceCreatorRegistration> {
    global()
        .read()
        .map_err(|_| Error::Internal("resource registry lock poisoned".to_string()))?
        .lookup(model)
}

/// Copy of the process-wide registry
pub fn global_snapshot() -> Result<ResourceRegistry> {
    Ok(global()
        .read()
        .map_err(|_| Error::Internal("resource registry lock poisoned".to_string()))?
        .clone())
}
