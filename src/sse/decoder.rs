//! Frame decoding
//!
//! Turns a raw frame into a [`DecodeOutcome`]: heartbeats are recognised
//! before any parsing, everything else must be a complete [`FlowEvent`].

use crate::events::FlowEvent;
use crate::sse::events::{DecodeOutcome, SseLine, SseParseError};

/// Leading character of SSE comment lines.
pub const COMMENT_MARKER: char = ':';

/// Whether a frame is a keep-alive comment.
pub fn is_heartbeat(frame: &str) -> bool {
    frame.starts_with(COMMENT_MARKER)
}

/// Parse a single SSE line into its component type
pub fn parse_sse_line(line: &str) -> SseLine {
    if line.is_empty() {
        return SseLine::Empty;
    }

    if line.starts_with(COMMENT_MARKER) {
        return SseLine::Comment(line.to_string());
    }

    if let Some(rest) = line.strip_prefix("data:") {
        return SseLine::Data(strip_field_space(rest).to_string());
    }

    if let Some(rest) = line.strip_prefix("event:") {
        return SseLine::Event(rest.trim().to_string());
    }

    SseLine::Other(line.to_string())
}

/// SSE strips exactly one space after the field colon.
fn strip_field_space(value: &str) -> &str {
    value.strip_prefix(' ').unwrap_or(value)
}

/// Decode one frame.
///
/// Never fails outright: malformed frames come back as
/// [`DecodeOutcome::Malformed`] so the caller can log and move on.
pub fn decode_frame(frame: &str) -> DecodeOutcome {
    if is_heartbeat(frame) {
        return DecodeOutcome::Heartbeat;
    }

    let value: serde_json::Value = match serde_json::from_str(frame) {
        Ok(v) => v,
        Err(e) => {
            return DecodeOutcome::Malformed(SseParseError::InvalidJson {
                source: e.to_string(),
            })
        }
    };

    if !value.is_object() {
        return DecodeOutcome::Malformed(SseParseError::NotAnObject);
    }

    match serde_json::from_value::<FlowEvent>(value) {
        Ok(event) => DecodeOutcome::Decoded(event),
        Err(e) => DecodeOutcome::Malformed(SseParseError::InvalidShape {
            source: e.to_string(),
        }),
    }
}
