//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`EventTransport`] - Push channel to an event resource

pub mod transport;

pub use transport::{EventTransport, FrameStream, TransportError};
