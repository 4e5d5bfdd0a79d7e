//! Event transport trait abstraction.
//!
//! Provides a trait-based abstraction over the push channel, enabling
//! dependency injection and mocking in tests.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Stream of raw text frames. Dropping it closes the transport.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

/// Transport errors.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Could not reach the server
    ConnectionFailed(String),
    /// Server answered with a non-success status
    HttpStatus { status: u16, message: String },
    /// The open stream failed mid-flight
    Stream(String),
    /// The server ended the stream
    Closed,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            TransportError::HttpStatus { status, message } => {
                write!(f, "Server error ({}): {}", status, message)
            }
            TransportError::Stream(msg) => write!(f, "Stream error: {}", msg),
            TransportError::Closed => write!(f, "Stream closed by server"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Trait for opening a push channel to an event resource.
///
/// The three lifecycle signals map onto the return values:
/// - `Ok(stream)` from [`open`](EventTransport::open) - the transport is open
/// - `Some(Ok(frame))` from the stream - a message arrived
/// - `Err(_)` from `open`, `Some(Err(_))` or `None` from the stream - error
///
/// # Example
///
/// ```ignore
/// use flowstream::traits::EventTransport;
/// use futures::StreamExt;
///
/// async fn tail<T: EventTransport>(transport: &T, url: &str) {
///     let mut frames = transport.open(url).await?;
///     while let Some(Ok(frame)) = frames.next().await {
///         println!("{}", frame);
///     }
/// }
/// ```
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Open a transport to `url`.
    async fn open(&self, url: &str) -> Result<FrameStream, TransportError>;
}
