//! Mock event transport for testing.
//!
//! Each call to `open` consumes one scripted outcome: either a failure or an
//! accepted connection whose frames the test pushes through a
//! [`MockConnection`] handle.

use async_trait::async_trait;
use futures::channel::mpsc;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::traits::{EventTransport, FrameStream, TransportError};

type FrameSender = mpsc::UnboundedSender<Result<String, TransportError>>;
type FrameReceiver = mpsc::UnboundedReceiver<Result<String, TransportError>>;

enum Script {
    Fail(TransportError),
    Accept(FrameSender, FrameReceiver),
}

/// One recorded call to `open`.
#[derive(Debug, Clone)]
pub struct OpenRecord {
    pub url: String,
    pub at: Instant,
    /// Previously accepted connections still held open by the client
    pub live_connections: usize,
}

#[derive(Default)]
struct MockState {
    scripts: VecDeque<Script>,
    opens: Vec<OpenRecord>,
    /// Senders of connections handed out by `open`
    accepted: Vec<FrameSender>,
}

/// Mock transport for testing.
///
/// This mock allows:
/// - Scripting the outcome of each `open` call
/// - Injecting frames and errors into accepted connections
/// - Inspecting which URLs were opened, and when
///
/// An `open` with nothing scripted fails with `ConnectionFailed`.
///
/// # Example
///
/// ```ignore
/// use flowstream::adapters::mock::MockTransport;
///
/// let transport = MockTransport::new();
/// let conn = transport.accept_next_open();
/// conn.send_frame(r#"{"type":"debug","flow_id":"f1","data":{},"timestamp":"T0"}"#);
/// transport.fail_next_open(TransportError::ConnectionFailed("down".into()));
/// ```
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    open_count_tx: Arc<watch::Sender<usize>>,
}

impl MockTransport {
    /// Create a new mock with nothing scripted.
    pub fn new() -> Self {
        let (open_count_tx, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            open_count_tx: Arc::new(open_count_tx),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Script the next unscripted `open` to succeed.
    pub fn accept_next_open(&self) -> MockConnection {
        let (tx, rx) = mpsc::unbounded();
        self.lock()
            .scripts
            .push_back(Script::Accept(tx.clone(), rx));
        MockConnection { tx }
    }

    /// Script the next unscripted `open` to fail with `error`.
    pub fn fail_next_open(&self, error: TransportError) {
        self.lock().scripts.push_back(Script::Fail(error));
    }

    /// Script `count` consecutive failing opens.
    pub fn fail_opens(&self, count: usize) {
        for i in 0..count {
            self.fail_next_open(TransportError::ConnectionFailed(format!(
                "scripted failure {}",
                i + 1
            )));
        }
    }

    /// All `open` calls so far.
    pub fn opens(&self) -> Vec<OpenRecord> {
        self.lock().opens.clone()
    }

    /// URLs passed to `open`, in order.
    pub fn opened_urls(&self) -> Vec<String> {
        self.lock().opens.iter().map(|o| o.url.clone()).collect()
    }

    pub fn open_count(&self) -> usize {
        self.lock().opens.len()
    }

    /// Wait until at least `count` opens have happened.
    pub async fn wait_for_opens(&self, count: usize) {
        let mut rx = self.open_count_tx.subscribe();
        let _ = rx.wait_for(|opened| *opened >= count).await;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventTransport for MockTransport {
    async fn open(&self, url: &str) -> Result<FrameStream, TransportError> {
        let script = {
            let mut state = self.lock();
            let live_connections = state.accepted.iter().filter(|tx| !tx.is_closed()).count();
            state.opens.push(OpenRecord {
                url: url.to_string(),
                at: Instant::now(),
                live_connections,
            });
            let script = state.scripts.pop_front();
            if let Some(Script::Accept(tx, _)) = &script {
                state.accepted.push(tx.clone());
            }
            script
        };
        self.open_count_tx.send_modify(|count| *count += 1);

        match script {
            Some(Script::Accept(_, rx)) => Ok(Box::pin(rx)),
            Some(Script::Fail(error)) => Err(error),
            None => Err(TransportError::ConnectionFailed(
                "no scripted connection".to_string(),
            )),
        }
    }
}

/// Handle to an accepted mock connection.
#[derive(Clone)]
pub struct MockConnection {
    tx: FrameSender,
}

impl MockConnection {
    /// Deliver a raw frame.
    pub fn send_frame(&self, frame: impl Into<String>) {
        // Ignore send errors (transport already closed)
        let _ = self.tx.unbounded_send(Ok(frame.into()));
    }

    /// Deliver several raw frames in order.
    pub fn send_frames<I, S>(&self, frames: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for frame in frames {
            self.send_frame(frame);
        }
    }

    /// Fail the connection with a transport error.
    pub fn fail(&self, error: TransportError) {
        let _ = self.tx.unbounded_send(Err(error));
    }

    /// End the stream as if the server hung up.
    pub fn close(&self) {
        self.tx.close_channel();
    }

    /// Whether the client dropped its end of the transport (or the test
    /// closed it).
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_unscripted_open_fails() {
        let mock = MockTransport::new();
        let result = mock.open("http://x/events").await;
        assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
        assert_eq!(mock.open_count(), 1);
    }

    #[tokio::test]
    async fn test_scripts_consumed_in_order() {
        let mock = MockTransport::new();
        mock.fail_next_open(TransportError::Closed);
        let conn = mock.accept_next_open();

        assert_eq!(mock.open("a").await.err(), Some(TransportError::Closed));

        conn.send_frame("hello");
        let mut frames = mock.open("b").await.unwrap();
        assert_eq!(frames.next().await, Some(Ok("hello".to_string())));

        assert_eq!(mock.opened_urls(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_connection_close_ends_stream() {
        let mock = MockTransport::new();
        let conn = mock.accept_next_open();
        let mut frames = mock.open("u").await.unwrap();

        conn.close();
        assert!(frames.next().await.is_none());
    }

    #[tokio::test]
    async fn test_dropping_stream_is_observed() {
        let mock = MockTransport::new();
        let conn = mock.accept_next_open();
        let frames = mock.open("u").await.unwrap();

        assert!(!conn.is_closed());
        drop(frames);
        assert!(conn.is_closed());
    }

    #[tokio::test]
    async fn test_live_connections_recorded() {
        let mock = MockTransport::new();
        let _first = mock.accept_next_open();
        let _second = mock.accept_next_open();

        let frames = mock.open("a").await.unwrap();
        drop(frames);
        let _frames = mock.open("b").await.unwrap();
        let _ = mock.open("c").await;

        let live: Vec<usize> = mock.opens().iter().map(|o| o.live_connections).collect();
        assert_eq!(live, vec![0, 0, 1]);
    }

    #[tokio::test]
    async fn test_wait_for_opens() {
        let mock = MockTransport::new();
        let m = mock.clone();
        tokio::spawn(async move {
            let _ = m.open("u").await;
            let _ = m.open("u").await;
        });
        mock.wait_for_opens(2).await;
        assert_eq!(mock.open_count(), 2);
    }
}
