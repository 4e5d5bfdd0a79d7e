//! Multi-consumer event dispatch.
//!
//! [`DispatchRegistry`] maps an event type (or the [`WILDCARD`] key) to an
//! ordered, identity-deduplicated set of handlers. Dispatch runs every
//! matching handler in sequence and isolates failures per handler.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::error;

use crate::error::{HandlerError, HandlerResult, StreamError};
use crate::events::{FlowEvent, WILDCARD};

/// A subscriber callback.
///
/// Identity is the `Arc` allocation: register a clone of the same `Arc` to
/// refer to the same handler.
pub type EventHandler = Arc<dyn Fn(&FlowEvent) -> HandlerResult + Send + Sync>;

/// Wrap a closure as an [`EventHandler`].
pub fn handler<F>(f: F) -> EventHandler
where
    F: Fn(&FlowEvent) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Outcome counts of a single dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers that returned `Ok`
    pub delivered: usize,
    /// Handlers that returned an error or panicked
    pub failed: usize,
}

impl DispatchReport {
    pub fn invoked(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Registry of subscribers keyed by event type.
///
/// Entries live as long as the registry; connection churn never clears them.
#[derive(Default)]
pub struct DispatchRegistry {
    handlers: Mutex<HashMap<String, Vec<EventHandler>>>,
}

impl DispatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<EventHandler>>> {
        // Handlers never run under this lock, so a poisoned map is still consistent
        self.handlers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register `handler` for `event_type`. Registering the same handler
    /// twice for the same type is a no-op.
    pub fn subscribe(&self, event_type: &str, handler: EventHandler) {
        let mut map = self.lock();
        let set = map.entry(event_type.to_string()).or_default();
        if !set.iter().any(|existing| Arc::ptr_eq(existing, &handler)) {
            set.push(handler);
        }
    }

    /// Remove `handler` from `event_type`. No-op if it was never registered.
    pub fn unsubscribe(&self, event_type: &str, handler: &EventHandler) {
        let mut map = self.lock();
        if let Some(set) = map.get_mut(event_type) {
            set.retain(|existing| !Arc::ptr_eq(existing, handler));
            if set.is_empty() {
                map.remove(event_type);
            }
        }
    }

    /// Register `handler` for every event type.
    pub fn subscribe_any(&self, handler: EventHandler) {
        self.subscribe(WILDCARD, handler);
    }

    /// Number of handlers registered under `event_type`.
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.lock().get(event_type).map_or(0, Vec::len)
    }

    /// Snapshot the handlers for one dispatch: typed handlers first, then
    /// wildcard handlers.
    fn matching(&self, event_type: &str) -> Vec<EventHandler> {
        let map = self.lock();
        let typed = map.get(event_type).into_iter().flatten();
        let wildcard = if event_type == WILDCARD {
            None
        } else {
            map.get(WILDCARD)
        };
        typed.chain(wildcard.into_iter().flatten()).cloned().collect()
    }

    /// Deliver `event` to every handler subscribed to its type, then to every
    /// wildcard handler.
    ///
    /// The lock is released before any handler runs, so handlers may
    /// subscribe or unsubscribe re-entrantly; such changes apply from the
    /// next event.
    pub fn dispatch(&self, event: &FlowEvent) -> DispatchReport {
        let mut report = DispatchReport::default();

        for handler in self.matching(&event.event_type) {
            match invoke(&handler, event) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    report.failed += 1;
                    let err = StreamError::Handler {
                        event_type: event.event_type.clone(),
                        message: err.to_string(),
                    };
                    error!(
                        code = err.error_code(),
                        flow_id = %event.flow_id,
                        "{}",
                        err
                    );
                }
            }
        }

        report
    }
}

impl std::fmt::Debug for DispatchRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let map = self.lock();
        let mut counts: Vec<(&String, usize)> = map.iter().map(|(k, v)| (k, v.len())).collect();
        counts.sort();
        f.debug_struct("DispatchRegistry")
            .field("handlers", &counts)
            .finish()
    }
}

/// Run one handler, turning a panic into a [`HandlerError`].
fn invoke(handler: &EventHandler, event: &FlowEvent) -> HandlerResult {
    match catch_unwind(AssertUnwindSafe(|| handler(event))) {
        Ok(result) => result,
        Err(payload) => {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            Err(HandlerError::Panicked(message))
        }
    }
}
