use thiserror::Error;

/// A result type for monitoring and reporting
pub type Result<T> = std::result::Result<T, MonitorError>;

/// An error when monitoring the process or writing reports
#[derive(Error, Debug)]
pub enum MonitorError {
    /// When the model output has an unexpected number of columns
    #[error("Unexpected prediction shape: {0} outputs")]
    PredictionShape(usize),
    /// When data handling fails
    #[error(transparent)]
    DataError(#[from] pelletq_data::DataError),
    /// When the model fails
    #[error(transparent)]
    ModelError(#[from] pelletq_model::ModelError),
    /// When writing a report fails
    #[error("Report IO error: {0}")]
    IoError(#[from] std::io::Error),
}
