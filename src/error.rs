use crate::lifecycle::LifecycleError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PyramidionError>;

#[derive(Debug, Error)]
pub enum PyramidionError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration for {key}: {message}")]
    Config { key: String, message: String },
}
