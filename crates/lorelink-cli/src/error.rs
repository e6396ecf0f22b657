//! Error handling for the lorelink CLI

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Lorelink core error: {0}")]
    Core(#[from] lorelink_core::LorelinkError),

    #[error("Lorelink runtime error: {0}")]
    Runtime(#[from] lorelink_runtime::RuntimeError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Demo run failed: {0}")]
    Demo(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        CliError::Config(err.to_string())
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::Config(err.to_string())
    }
}
