//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestSseTransport`] - HTTP SSE transport using reqwest
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::MockTransport`] - Scripted opens and frame injection

pub mod mock;
pub mod reqwest_sse;

pub use mock::{MockConnection, MockTransport};
pub use reqwest_sse::ReqwestSseTransport;
