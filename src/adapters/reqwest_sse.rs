//! Reqwest-based SSE transport adapter.
//!
//! This module provides the production [`EventTransport`] implementation: a
//! long-lived `GET` whose body is split into SSE frames.

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::sse::SseFrameAccumulator;
use crate::traits::{EventTransport, FrameStream, TransportError};

/// SSE transport using reqwest.
///
/// # Example
///
/// ```ignore
/// use flowstream::adapters::ReqwestSseTransport;
/// use flowstream::traits::EventTransport;
///
/// let transport = ReqwestSseTransport::new();
/// let frames = transport.open("http://127.0.0.1:8000/api/sse/flows/events").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestSseTransport {
    client: reqwest::Client,
}

impl ReqwestSseTransport {
    /// Create a new transport with default settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a transport with a custom reqwest::Client.
    ///
    /// Do not set a total request timeout on it: the stream is expected to
    /// stay open indefinitely.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying reqwest::Client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Convert reqwest error to TransportError.
    fn convert_error(err: reqwest::Error) -> TransportError {
        if err.is_connect() || err.is_timeout() {
            TransportError::ConnectionFailed(err.to_string())
        } else {
            TransportError::Stream(err.to_string())
        }
    }
}

impl Default for ReqwestSseTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventTransport for ReqwestSseTransport {
    async fn open(&self, url: &str) -> Result<FrameStream, TransportError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(Self::convert_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TransportError::HttpStatus { status, message });
        }

        let mut accumulator = SseFrameAccumulator::new();
        let frames = response
            .bytes_stream()
            .map(move |chunk| match chunk {
                Ok(bytes) => accumulator
                    .feed(&bytes)
                    .into_iter()
                    .map(Ok)
                    .collect::<Vec<_>>(),
                Err(e) => vec![Err(Self::convert_error(e))],
            })
            .flat_map(futures::stream::iter);

        Ok(Box::pin(frames))
    }
}
