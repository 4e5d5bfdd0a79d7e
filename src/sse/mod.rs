//! SSE (Server-Sent Events) frame handling
//!
//! The flow server speaks plain SSE:
//! - `data: <json>` - one JSON event record per frame
//! - Empty line - signals end of frame
//! - Lines starting with `:` - heartbeat comments (always discarded)
//!
//! # Module structure
//! - `events` - Line and decode result types (SseLine, DecodeOutcome, SseParseError)
//! - `frame` - Stateful line accumulator turning a byte stream into frames
//! - `decoder` - Frame classification and event decoding

mod decoder;
mod events;
mod frame;

pub use decoder::{decode_frame, is_heartbeat, parse_sse_line, COMMENT_MARKER};
pub use events::{DecodeOutcome, SseLine, SseParseError};
pub use frame::{SseFrameAccumulator, MAX_LINE_LEN};
