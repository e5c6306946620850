use thiserror::Error;

/// A result type for model training and persistence
pub type Result<T> = std::result::Result<T, ModelError>;

/// An error when training, evaluating or persisting a model
#[derive(Error, Debug)]
pub enum ModelError {
    /// When a model is used or saved before training
    #[error("No trained model: call train() first")]
    NotTrained,
    /// When error due to a bad value
    #[error("InvalidValue error: {0}")]
    InvalidValueError(String),
    /// When linear algebra computation fails
    #[error(transparent)]
    LinalgError(#[from] linfa_linalg::LinalgError),
    /// When a linfa error occurs
    #[error(transparent)]
    LinfaError(#[from] linfa::error::Error),
    /// When data handling fails
    #[error(transparent)]
    DataError(#[from] pelletq_data::DataError),
    /// When error during saving or loading
    #[error("Model IO error: {0}")]
    IoError(#[from] std::io::Error),
    /// When binary (de)serialization fails
    #[error("Binary error: {0}")]
    BinaryError(#[from] bincode::Error),
}
