// Typed errors with thiserror. Only construction and configuration surface them to JS;
// runtime input paths log and degrade to "no motion this frame".

use thiserror::Error;

/// Relay error types.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Frame scheduling failed: {0}")]
    Scheduler(String),

    #[error("DOM unavailable: {0}")]
    Dom(String),
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::Serialization(err.to_string())
    }
}
