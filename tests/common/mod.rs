//! Common test utilities for integration tests.
//!
//! Fixtures for building frames, recording handler invocations and driving
//! a client over [`MockTransport`].

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use flowstream::adapters::mock::MockTransport;
use flowstream::{handler, ConnectionState, EventHandler, FlowEvent, FlowEventClient, StreamConfig};

pub const BASE_URL: &str = "http://flows.test";

/// Builds a wire frame for an event.
pub fn frame(event_type: &str, flow_id: &str, timestamp: &str) -> String {
    serde_json::json!({
        "type": event_type,
        "flow_id": flow_id,
        "data": {},
        "timestamp": timestamp,
    })
    .to_string()
}

/// URL the client opens for `flow_id`.
pub fn scoped_url(flow_id: &str) -> String {
    format!("{}/api/sse/flows/{}/events", BASE_URL, flow_id)
}

pub fn global_url() -> String {
    format!("{}/api/sse/flows/events", BASE_URL)
}

/// Creates a client over `mock` with the default reconnect policy.
pub fn client_with(mock: &MockTransport) -> FlowEventClient {
    FlowEventClient::new(
        StreamConfig::default().with_base_url(BASE_URL),
        Arc::new(mock.clone()),
    )
}

/// Handler that records every event it receives.
#[derive(Clone)]
pub struct Recorder {
    pub handler: EventHandler,
    events: Arc<Mutex<Vec<FlowEvent>>>,
}

impl Recorder {
    pub fn new() -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let handler = handler(move |event| {
            sink.lock().unwrap().push(event.clone());
            Ok(())
        });
        Self { handler, events }
    }

    pub fn events(&self) -> Vec<FlowEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

/// Waits until the client's state satisfies `pred`.
pub async fn wait_for_state<F>(client: &FlowEventClient, pred: F)
where
    F: FnMut(&ConnectionState) -> bool,
{
    let mut rx = client.state_receiver();
    let _ = tokio::time::timeout(Duration::from_secs(30), rx.wait_for(pred))
        .await
        .expect("timed out waiting for connection state");
}

/// Waits until `recorder` has seen at least `count` events.
pub async fn wait_for_events(recorder: &Recorder, count: usize) {
    tokio::time::timeout(Duration::from_secs(30), async {
        while recorder.count() < count {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("timed out waiting for events");
}

/// Lets spawned tasks run until they block.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Log output captured by [`capture_logs`].
#[derive(Clone, Default)]
pub struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }

    /// Captured lines containing `needle`.
    pub fn lines_with(&self, needle: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Routes this thread's tracing output into a buffer until the guard drops.
///
/// On the current-thread runtime spawned tasks run on the test thread, so
/// the client's logs are captured too.
pub fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}
