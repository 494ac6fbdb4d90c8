//! Error types for the Doubt Resolution Agent
//!
//! Each external collaborator has its own error enum so the resolver can
//! decide per step how a failure is recovered. None of these ever reach an
//! HTTP client as a non-2xx status from `/solve-doubt`.

use thiserror::Error;

/// Errors from the document store collaborator
#[derive(Error, Debug)]
pub enum StoreError {
    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// The store answered with a non-success status
    #[error("Store returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The stored document could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Errors from the generative-text collaborator
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// The model endpoint answered with a non-success status
    #[error("Model returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response carried no text candidate
    #[error("Empty response from model")]
    EmptyResponse,

    /// The response body could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Errors raised while loading the canned answer catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// File access error
    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Two canned answers share the same key
    #[error("Duplicate canned answer key: {0}")]
    DuplicateKey(String),

    /// An entry has an empty key or keyword
    #[error("Empty {0} in catalog entry")]
    EmptyField(&'static str),
}

/// Crate-level error
#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Telemetry(#[from] crate::telemetry::TelemetryError),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AgentError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        AgentError::Config(msg.into())
    }
}

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;
