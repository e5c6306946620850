use thiserror::Error;

/// A result type for data loading and cleaning
pub type Result<T> = std::result::Result<T, DataError>;

/// An error when loading or cleaning process data
#[derive(Error, Debug)]
pub enum DataError {
    /// When the source file cannot be read or decoded, or a row is malformed
    #[error("Load error: {0}")]
    LoadError(String),
    /// When a required column is missing or two columns collide
    #[error("Schema error: {0}")]
    SchemaError(String),
    /// When an operation receives an invalid value
    #[error("InvalidValue error: {0}")]
    InvalidValueError(String),
    /// When IO fails
    #[error("Load IO error")]
    IoError(#[from] std::io::Error),
    /// When a quantile cannot be computed
    #[error(transparent)]
    QuantileError(#[from] ndarray_stats::errors::QuantileError),
}
