//! Flowstream - live client for workflow execution event streams
//!
//! Subscribes to a server-pushed stream of flow events (node started,
//! completed or failed, loop boundaries, flow state changes), decodes each
//! frame and hands it to every interested subscriber. Transport failures
//! are recovered with a bounded, linear reconnect policy.

pub mod adapters;
pub mod cli;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod reconnect;
pub mod sse;
pub mod traits;

pub use client::{ConnectionState, FlowEventClient};
pub use config::StreamConfig;
pub use dispatch::{handler, DispatchRegistry, EventHandler};
pub use error::{HandlerError, HandlerResult, StreamError};
pub use events::{FlowEvent, FlowEventKind, WILDCARD};
