use std::path::PathBuf;
use thiserror::Error;

/// A result type for the pelletq workflows
pub type Result<T> = std::result::Result<T, PelletError>;

/// An error when running a pelletq workflow
#[derive(Error, Debug)]
pub enum PelletError {
    /// When the plant data file cannot be loaded
    #[error("Cannot load data from {0}")]
    LoadFailed(PathBuf),
    /// When the configuration is inconsistent
    #[error("Config error: {0}")]
    ConfigError(String),
    /// When data handling fails
    #[error(transparent)]
    DataError(#[from] pelletq_data::DataError),
    /// When model training or loading fails
    #[error(transparent)]
    ModelError(#[from] pelletq_model::ModelError),
    /// When monitoring or reporting fails
    #[error(transparent)]
    MonitorError(#[from] pelletq_monitor::MonitorError),
    /// When reading a file fails
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    /// When a JSON document cannot be read
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
