//! Mock implementations for testing.
//!
//! Lets the client be exercised end to end without a network.

pub mod transport;

pub use transport::{MockConnection, MockTransport, OpenRecord};
