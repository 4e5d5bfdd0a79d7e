//! SSE line and decode result types

use crate::events::FlowEvent;

/// Represents a parsed SSE line
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// Event type declaration (e.g., "event: message")
    Event(String),
    /// Data payload (e.g., "data: {\"type\": \"node_start\"}")
    Data(String),
    /// Empty line - signals end of frame
    Empty,
    /// Comment line (starts with ':'), kept verbatim
    Comment(String),
    /// Any other field (`id:`, `retry:`, unknown names)
    Other(String),
}

/// Result of decoding one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    /// Keep-alive comment, nothing to dispatch
    Heartbeat,
    /// A well-formed event record
    Decoded(FlowEvent),
    /// The frame could not be decoded and must be dropped
    Malformed(SseParseError),
}

impl DecodeOutcome {
    /// The decoded event, if any.
    pub fn into_event(self) -> Option<FlowEvent> {
        match self {
            DecodeOutcome::Decoded(event) => Some(event),
            _ => None,
        }
    }
}

/// Errors that can occur while decoding a frame
#[derive(Debug, Clone, PartialEq)]
pub enum SseParseError {
    /// Frame body is not valid JSON
    InvalidJson { source: String },
    /// Frame body is JSON but not an object
    NotAnObject,
    /// Frame body lacks a required key or has the wrong shape
    InvalidShape { source: String },
}

impl std::fmt::Display for SseParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SseParseError::InvalidJson { source } => write!(f, "Invalid JSON in frame: {}", source),
            SseParseError::NotAnObject => write!(f, "Frame body is not a JSON object"),
            SseParseError::InvalidShape { source } => {
                write!(f, "Frame is not a flow event: {}", source)
            }
        }
    }
}

impl std::error::Error for SseParseError {}
