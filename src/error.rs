//! Error types for the anomaly sensor component and its host shim.

use thiserror::Error;

/// Result type alias for sensor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for sensor, registry and module operations
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration attribute has the wrong type or an illegal value
    #[error("Configuration error: {field}: {message}")]
    Configuration { field: String, message: String },

    /// A caller-supplied reading is not numeric
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Malformed `namespace:family:name` model identifier
    #[error("Invalid model identifier: {0}")]
    InvalidModel(String),

    /// No creator registered for the model
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// A creator is already registered for the model
    #[error("Model already registered: {0}")]
    AlreadyRegistered(String),

    /// No resource with that name exists in the module
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// A resource with that name already exists in the module
    #[error("Resource already exists: {0}")]
    ResourceExists(String),

    /// A dependency named by the validator is not available
    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    /// The operation did not complete within the caller's timeout
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Configuration source could not be loaded or deserialized
    #[error("Config load error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build a configuration error for `field`
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            Error::Configuration { .. } => "configuration_error",
            Error::InvalidInput(_) => "invalid_input",
            Error::InvalidModel(_) => "invalid_model",
            Error::ModelNotFound(_) => "model_not_found",
            Error::AlreadyRegistered(_) => "already_registered",
            Error::ResourceNotFound(_) => "resource_not_found",
            Error::ResourceExists(_) => "resource_exists",
            Error::MissingDependency(_) => "missing_dependency",
            Error::Timeout(_) => "timeout",
            Error::ConfigLoad(_) => "config_load_error",
            Error::Json(_) => "json_error",
            Error::Internal(_) => "internal_error",
        }
    }
}
