//! Streaming-related error types.
//!
//! This module defines the failures the event-stream client observes while
//! a subscription is live. None of them ever reach an API caller; they are
//! logged and reflected in the connection state.

use std::fmt;

use crate::sse::SseParseError;

/// Stream-specific error variants.
#[derive(Debug, Clone)]
pub enum StreamError {
    /// Transport dropped or could not be opened.
    Transport {
        message: String,
    },

    /// A frame could not be decoded and was dropped.
    Decode {
        source: SseParseError,
    },

    /// A subscriber failed while handling an event.
    Handler {
        event_type: String,
        message: String,
    },

    /// The reconnect budget ran out.
    RetryExhausted {
        attempts: u32,
    },
}

impl StreamError {
    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::Transport { .. } => {
                "Connection to the event stream was lost. Attempting to reconnect...".to_string()
            }
            StreamError::Decode { .. } => {
                "Received an unreadable event from the server. It was skipped.".to_string()
            }
            StreamError::Handler { event_type, .. } => {
                format!("A listener failed while handling a {} event.", event_type)
            }
            StreamError::RetryExhausted { attempts } => format!(
                "Could not reconnect to the event stream after {} attempts. Reconnect manually to resume.",
                attempts
            ),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::Transport { .. } => "E_STREAM_TRANSPORT",
            StreamError::Decode { .. } => "E_STREAM_DECODE",
            StreamError::Handler { .. } => "E_STREAM_HANDLER",
            StreamError::RetryExhausted { .. } => "E_STREAM_EXHAUSTED",
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Transport { message } => {
                write!(f, "Stream transport error: {}", message)
            }
            StreamError::Decode { source } => {
                write!(f, "Failed to decode frame: {}", source)
            }
            StreamError::Handler { event_type, message } => {
                write!(f, "Handler for {} event failed: {}", event_type, message)
            }
            StreamError::RetryExhausted { attempts } => {
                write!(f, "Gave up reconnecting after {} attempts", attempts)
            }
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::Decode { source } => Some(source),
            _ => None,
        }
    }
}

impl From<SseParseError> for StreamError {
    fn from(source: SseParseError) -> Self {
        StreamError::Decode { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error() {
        let err = StreamError::Transport {
            message: "connection reset".to_string(),
        };
        assert_eq!(err.error_code(), "E_STREAM_TRANSPORT");
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_decode_is_local() {
        let err: StreamError = SseParseError::NotAnObject.into();
        assert_eq!(err.error_code(), "E_STREAM_DECODE");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_handler_error_names_event_type() {
        let err = StreamError::Handler {
            event_type: "node_start".to_string(),
            message: "boom".to_string(),
        };
        assert_eq!(err.error_code(), "E_STREAM_HANDLER");
        assert!(err.user_message().contains("node_start"));
        assert_eq!(err.to_string(), "Handler for node_start event failed: boom");
    }

    #[test]
    fn test_retry_exhausted_is_terminal() {
        let err = StreamError::RetryExhausted { attempts: 5 };
        assert_eq!(err.error_code(), "E_STREAM_EXHAUSTED");
        assert!(err.user_message().contains("5 attempts"));
    }
}
