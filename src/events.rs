//! Flow event records delivered by the event stream.
//!
//! Every decoded frame becomes a [`FlowEvent`]. The record is immutable once
//! decoded; subscribers only ever see it by shared reference.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Registry key that matches every event type.
pub const WILDCARD: &str = "*";

/// Well-known event type names sent by the flow server.
pub mod kinds {
    pub const NODE_START: &str = "node_start";
    pub const NODE_COMPLETE: &str = "node_complete";
    pub const NODE_ERROR: &str = "node_error";
    pub const LOOP_START: &str = "loop_start";
    pub const LOOP_COMPLETE: &str = "loop_complete";
    pub const FLOW_START: &str = "flow_start";
    pub const FLOW_STOP: &str = "flow_stop";
    pub const FLOW_ERROR: &str = "flow_error";
    pub const FLOW_STATUS: &str = "flow_status";
    pub const DEBUG: &str = "debug";
    pub const FRAME_UPDATE: &str = "frame_update";
    pub const CONNECTED: &str = "connected";
}

/// A single event pushed by the server.
///
/// Unknown extra keys on the wire are ignored; all four fields are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEvent {
    /// Event kind, e.g. `node_start`
    #[serde(rename = "type")]
    pub event_type: String,
    /// Workflow instance the event concerns
    pub flow_id: String,
    /// Event-specific payload
    pub data: serde_json::Map<String, serde_json::Value>,
    /// Production time as sent by the server
    pub timestamp: String,
}

impl FlowEvent {
    /// Build an event with an empty payload.
    pub fn new(
        event_type: impl Into<String>,
        flow_id: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            flow_id: flow_id.into(),
            data: serde_json::Map::new(),
            timestamp: timestamp.into(),
        }
    }

    /// Attach a payload field.
    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Typed view of `event_type`.
    pub fn kind(&self) -> FlowEventKind {
        FlowEventKind::from_type(&self.event_type)
    }

    /// Look up a payload field.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Parse the timestamp.
    ///
    /// Accepts RFC 3339 as well as the naive ISO-8601 form
    /// (`2024-01-01T12:00:00.123456`) the flow server emits.
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(dt.naive_utc());
        }
        NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f").ok()
    }
}

/// Typed classification of event types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlowEventKind {
    NodeStart,
    NodeComplete,
    NodeError,
    LoopStart,
    LoopComplete,
    FlowStart,
    FlowStop,
    FlowError,
    FlowStatus,
    Debug,
    FrameUpdate,
    Connected,
    /// Any type this client does not know about
    Other(String),
}

impl FlowEventKind {
    pub fn from_type(event_type: &str) -> Self {
        match event_type {
            kinds::NODE_START => Self::NodeStart,
            kinds::NODE_COMPLETE => Self::NodeComplete,
            kinds::NODE_ERROR => Self::NodeError,
            kinds::LOOP_START => Self::LoopStart,
            kinds::LOOP_COMPLETE => Self::LoopComplete,
            kinds::FLOW_START => Self::FlowStart,
            kinds::FLOW_STOP => Self::FlowStop,
            kinds::FLOW_ERROR => Self::FlowError,
            kinds::FLOW_STATUS => Self::FlowStatus,
            kinds::DEBUG => Self::Debug,
            kinds::FRAME_UPDATE => Self::FrameUpdate,
            kinds::CONNECTED => Self::Connected,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::NodeStart => kinds::NODE_START,
            Self::NodeComplete => kinds::NODE_COMPLETE,
            Self::NodeError => kinds::NODE_ERROR,
            Self::LoopStart => kinds::LOOP_START,
            Self::LoopComplete => kinds::LOOP_COMPLETE,
            Self::FlowStart => kinds::FLOW_START,
            Self::FlowStop => kinds::FLOW_STOP,
            Self::FlowError => kinds::FLOW_ERROR,
            Self::FlowStatus => kinds::FLOW_STATUS,
            Self::Debug => kinds::DEBUG,
            Self::FrameUpdate => kinds::FRAME_UPDATE,
            Self::Connected => kinds::CONNECTED,
            Self::Other(name) => name,
        }
    }

    /// Whether this event reports a failure.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::NodeError | Self::FlowError)
    }
}

impl fmt::Display for FlowEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_from_known_types() {
        assert_eq!(FlowEventKind::from_type("node_start"), FlowEventKind::NodeStart);
        assert_eq!(FlowEventKind::from_type("loop_complete"), FlowEventKind::LoopComplete);
        assert_eq!(FlowEventKind::from_type("frame_update"), FlowEventKind::FrameUpdate);
        assert_eq!(FlowEventKind::from_type("connected"), FlowEventKind::Connected);
    }

    #[test]
    fn test_kind_other_preserves_name() {
        let kind = FlowEventKind::from_type("custom_thing");
        assert_eq!(kind, FlowEventKind::Other("custom_thing".to_string()));
        assert_eq!(kind.as_str(), "custom_thing");
        assert_eq!(kind.to_string(), "custom_thing");
    }

    #[test]
    fn test_kind_is_error() {
        assert!(FlowEventKind::NodeError.is_error());
        assert!(FlowEventKind::FlowError.is_error());
        assert!(!FlowEventKind::FlowStop.is_error());
    }

    #[test]
    fn test_event_deserialize_ignores_extra_keys() {
        let event: FlowEvent = serde_json::from_value(json!({
            "type": "node_complete",
            "flow_id": "f1",
            "data": {"node_id": "n3", "duration": 1.5},
            "timestamp": "2024-05-01T10:00:00",
            "seq": 42
        }))
        .unwrap();

        assert_eq!(event.kind(), FlowEventKind::NodeComplete);
        assert_eq!(event.flow_id, "f1");
        assert_eq!(event.get("node_id"), Some(&json!("n3")));
    }

    #[test]
    fn test_builder_helpers() {
        let event = FlowEvent::new("debug", "f2", "T0").with_data("msg", json!("hi"));
        assert_eq!(event.event_type, "debug");
        assert_eq!(event.data.len(), 1);
    }

    #[test]
    fn test_parsed_timestamp_naive_iso() {
        let event = FlowEvent::new("debug", "f1", "2024-05-01T10:00:00.250000");
        let ts = event.parsed_timestamp().unwrap();
        assert_eq!(ts.to_string(), "2024-05-01 10:00:00.250");
    }

    #[test]
    fn test_parsed_timestamp_rfc3339() {
        let event = FlowEvent::new("debug", "f1", "2024-05-01T10:00:00+02:00");
        let ts = event.parsed_timestamp().unwrap();
        assert_eq!(ts.to_string(), "2024-05-01 08:00:00");
    }

    #[test]
    fn test_parsed_timestamp_garbage() {
        assert!(FlowEvent::new("debug", "f1", "T0").parsed_timestamp().is_none());
    }
}
