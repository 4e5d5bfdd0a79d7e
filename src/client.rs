//! Event-stream client.
//!
//! [`FlowEventClient`] owns one transport at a time, decodes its frames,
//! dispatches events to subscribers and re-opens the same scope after a
//! transport failure, following the [`ReconnectPolicy`](crate::reconnect::ReconnectPolicy).
//!
//! All public calls are infallible. Failures are logged and show up only as
//! connection state.
//!
//! Every connection lifetime carries an epoch. `connect` and `disconnect`
//! bump it under the control lock, so a task or timer from a superseded
//! connection can never change state or dispatch events.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::adapters::ReqwestSseTransport;
use crate::config::StreamConfig;
use crate::dispatch::{DispatchRegistry, EventHandler};
use crate::error::StreamError;
use crate::reconnect::{ReconnectController, ReconnectDecision};
use crate::sse::{decode_frame, DecodeOutcome};
use crate::traits::{EventTransport, FrameStream, TransportError};

/// Connection state
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    /// No transport and nothing scheduled
    Disconnected,
    /// A transport is being opened
    Connecting { scope: Option<String> },
    /// The transport reported open
    Connected { scope: Option<String> },
    /// Waiting `delay` before reconnect attempt `attempt`
    ReconnectPending {
        attempt: u32,
        delay: Duration,
        scope: Option<String>,
    },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected { .. })
    }
}

struct Control {
    epoch: u64,
    scope: Option<String>,
    /// Latest connection task. After `stop` it is aborted but kept, so the
    /// next `start` can wait for it to release its transport.
    task: Option<JoinHandle<()>>,
    reconnect: ReconnectController,
}

struct Shared {
    config: StreamConfig,
    transport: Arc<dyn EventTransport>,
    registry: DispatchRegistry,
    control: Mutex<Control>,
    state_tx: watch::Sender<ConnectionState>,
    runtime: Option<Handle>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Control> {
        self.control
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.lock().epoch == epoch
    }

    /// Tear down whatever is active and start a new connection lifetime.
    fn start(self: &Arc<Self>, scope: Option<String>) {
        let runtime = match self.runtime.clone().or_else(|| Handle::try_current().ok()) {
            Some(handle) => handle,
            None => {
                error!("connect called outside a tokio runtime; staying disconnected");
                return;
            }
        };

        let mut control = self.lock();
        control.epoch += 1;
        control.scope = scope.clone();
        let epoch = control.epoch;

        let previous = control.task.take();
        if let Some(task) = &previous {
            if !task.is_finished() {
                debug!("Replacing active event stream");
            }
            task.abort();
        }

        self.set_state(ConnectionState::Connecting {
            scope: scope.clone(),
        });

        let shared = Arc::clone(self);
        control.task = Some(runtime.spawn(run_connection(shared, epoch, scope, previous)));
    }

    fn stop(&self) {
        let mut control = self.lock();
        control.epoch += 1;
        control.reconnect.reset();
        control.scope = None;

        if let Some(task) = &control.task {
            if !task.is_finished() {
                info!("Disconnecting from event stream");
            }
            task.abort();
        }
        self.set_state(ConnectionState::Disconnected);
    }

    /// Transport opened. Returns false if this lifetime was superseded.
    fn on_open(&self, epoch: u64) -> bool {
        let mut control = self.lock();
        if control.epoch != epoch {
            return false;
        }
        control.reconnect.on_open();
        info!(flow_id = ?control.scope, "Event stream connected");
        self.set_state(ConnectionState::Connected {
            scope: control.scope.clone(),
        });
        true
    }

    /// Transport failed. Returns the delay before the next attempt, if any.
    fn on_error(&self, epoch: u64, cause: &TransportError) -> Option<Duration> {
        let mut control = self.lock();
        if control.epoch != epoch {
            return None;
        }

        let err = StreamError::Transport {
            message: cause.to_string(),
        };
        error!(code = err.error_code(), flow_id = ?control.scope, "{}", err);

        match control.reconnect.on_error() {
            ReconnectDecision::Retry { attempt, delay } => {
                info!(
                    attempt,
                    max_attempts = control.reconnect.policy().max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Scheduling event stream reconnect"
                );
                self.set_state(ConnectionState::ReconnectPending {
                    attempt,
                    delay,
                    scope: control.scope.clone(),
                });
                Some(delay)
            }
            ReconnectDecision::GiveUp { attempts } => {
                let err = StreamError::RetryExhausted { attempts };
                error!(code = err.error_code(), flow_id = ?control.scope, "{}", err);
                self.set_state(ConnectionState::Disconnected);
                None
            }
        }
    }

    /// Reconnect timer fired. Returns false if this lifetime was superseded.
    fn on_reconnect_due(&self, epoch: u64) -> bool {
        let control = self.lock();
        if control.epoch != epoch {
            return false;
        }
        self.set_state(ConnectionState::Connecting {
            scope: control.scope.clone(),
        });
        true
    }

    /// Decode and dispatch one frame. Returns false, without dispatching, if
    /// this lifetime was superseded.
    ///
    /// The epoch is checked after decoding, immediately before dispatch. A
    /// `connect` racing with that check on another worker can still see one
    /// last event from the old scope; it never arrives after an event from
    /// the new scope, since the new task waits for this one to end.
    fn handle_frame(&self, epoch: u64, frame: &str) -> bool {
        let outcome = decode_frame(frame);
        if !self.is_current(epoch) {
            return false;
        }

        match outcome {
            DecodeOutcome::Heartbeat => debug!("Heartbeat received"),
            DecodeOutcome::Decoded(event) => {
                debug!(
                    event_type = %event.event_type,
                    flow_id = %event.flow_id,
                    "Dispatching event"
                );
                self.registry.dispatch(&event);
            }
            DecodeOutcome::Malformed(source) => {
                let err = StreamError::from(source);
                warn!(code = err.error_code(), frame = %frame, "{}", err);
            }
        }
        true
    }

    /// Read frames until the transport fails or this lifetime is superseded.
    async fn pump(&self, epoch: u64, mut frames: FrameStream) -> TransportError {
        while let Some(item) = frames.next().await {
            match item {
                Ok(frame) => {
                    if !self.handle_frame(epoch, &frame) {
                        return TransportError::Closed;
                    }
                }
                Err(e) => return e,
            }
        }
        TransportError::Closed
    }
}

/// Run one connection lifetime: open, pump frames, back off, re-open.
async fn run_connection(
    shared: Arc<Shared>,
    epoch: u64,
    scope: Option<String>,
    previous: Option<JoinHandle<()>>,
) {
    // The old transport must be closed before a new one opens
    if let Some(task) = previous {
        let _ = task.await;
    }

    let url = shared.config.endpoint_url(scope.as_deref());

    loop {
        if !shared.is_current(epoch) {
            return;
        }

        info!(url = %url, "Connecting to event stream");
        let cause = match shared.transport.open(&url).await {
            Ok(frames) => {
                if !shared.on_open(epoch) {
                    return;
                }
                shared.pump(epoch, frames).await
            }
            Err(e) => e,
        };

        match shared.on_error(epoch, &cause) {
            Some(delay) => {
                tokio::time::sleep(delay).await;
                if !shared.on_reconnect_due(epoch) {
                    return;
                }
            }
            None => return,
        }
    }
}

/// Client for the flow event stream.
///
/// Subscriptions survive connection churn: they are kept across
/// `connect`, `disconnect` and automatic reconnects.
///
/// # Example
///
/// ```ignore
/// use flowstream::{handler, FlowEventClient, StreamConfig};
///
/// let client = FlowEventClient::from_config(StreamConfig::from_env());
/// client.subscribe("node_complete", handler(|event| {
///     println!("{} finished", event.flow_id);
///     Ok(())
/// }));
/// client.connect(Some("f1"));
/// ```
pub struct FlowEventClient {
    shared: Arc<Shared>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl FlowEventClient {
    /// Create a client over an arbitrary transport.
    pub fn new(config: StreamConfig, transport: Arc<dyn EventTransport>) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let reconnect = ReconnectController::new(config.reconnect_policy());

        let shared = Arc::new(Shared {
            config,
            transport,
            registry: DispatchRegistry::new(),
            control: Mutex::new(Control {
                epoch: 0,
                scope: None,
                task: None,
                reconnect,
            }),
            state_tx,
            runtime: Handle::try_current().ok(),
        });

        Self { shared, state_rx }
    }

    /// Create a client over HTTP SSE.
    pub fn from_config(config: StreamConfig) -> Self {
        Self::new(config, Arc::new(ReqwestSseTransport::new()))
    }

    /// Open the event stream for `scope` (one flow), or for all flows when
    /// `scope` is `None`.
    ///
    /// Any open or pending connection is torn down first. An explicit
    /// connect also restores the full reconnect budget.
    pub fn connect(&self, scope: Option<&str>) {
        self.shared.lock().reconnect.reset();
        self.shared.start(scope.map(str::to_string));
    }

    /// Close the stream and cancel any pending reconnect. Idempotent.
    pub fn disconnect(&self) {
        self.shared.stop();
    }

    /// Whether the transport is currently open.
    pub fn connected(&self) -> bool {
        self.state_rx.borrow().is_connected()
    }

    /// Get the current connection state
    pub fn state(&self) -> ConnectionState {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to connection state changes
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Scope of the active or pending connection.
    pub fn scope(&self) -> Option<String> {
        self.shared.lock().scope.clone()
    }

    /// Consecutive transport failures since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.lock().reconnect.attempts()
    }

    pub fn subscribe(&self, event_type: &str, handler: EventHandler) {
        self.shared.registry.subscribe(event_type, handler);
    }

    pub fn unsubscribe(&self, event_type: &str, handler: &EventHandler) {
        self.shared.registry.unsubscribe(event_type, handler);
    }

    /// Subscribe to every event type.
    pub fn subscribe_any(&self, handler: EventHandler) {
        self.shared.registry.subscribe_any(handler);
    }

    pub fn handler_count(&self, event_type: &str) -> usize {
        self.shared.registry.handler_count(event_type)
    }
}

impl Drop for FlowEventClient {
    fn drop(&mut self) {
        self.shared.stop();
    }
}
