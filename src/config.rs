//! Configuration
//!
//! Module configuration loaded from defaults, an optional TOML file and
//! `ANOMALY_SENSOR__*` environment variables.

mod loader;
mod types;

pub use loader::{ConfigLoader, ENV_PREFIX};
pub use types::{ComponentConfig, ModuleConfig};
