//! Error types for the event-stream client.
//!
//! | Error | Origin | Effect |
//! |-------|--------|--------|
//! | Transport | connection drop, network failure | reconnect scheduled |
//! | Decode | malformed frame | frame dropped |
//! | Handler | subscriber callback failed | that subscriber skipped |
//! | RetryExhausted | reconnect budget spent | client stays disconnected |
//!
//! None of these ever propagate out of the public client API.

mod handler;
mod stream;

pub use handler::{HandlerError, HandlerResult};
pub use stream::StreamError;
