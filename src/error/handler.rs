//! Subscriber failure type.

use thiserror::Error;

/// Failure reported by a subscriber callback.
///
/// Handler failures are isolated: they are logged and never stop sibling
/// handlers or later events.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    pub fn failed(message: impl Into<String>) -> Self {
        HandlerError::Failed(message.into())
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        HandlerError::Failed(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        HandlerError::Failed(message.to_string())
    }
}

/// Return type of every subscriber callback.
pub type HandlerResult = Result<(), HandlerError>;
