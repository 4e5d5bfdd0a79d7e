//! Client configuration.
//!
//! Use the builder methods to customize, or [`StreamConfig::from_env`] to
//! read overrides from the environment.

use std::time::Duration;

use tracing::warn;

use crate::reconnect::{ReconnectPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};

/// Default server address.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

pub const ENV_URL: &str = "FLOWSTREAM_URL";
pub const ENV_MAX_RETRIES: &str = "FLOWSTREAM_MAX_RETRIES";
pub const ENV_RETRY_BASE_MS: &str = "FLOWSTREAM_RETRY_BASE_MS";

/// Configuration for the event-stream client.
///
/// # Example
///
/// ```ignore
/// use flowstream::config::StreamConfig;
///
/// let config = StreamConfig::default()
///     .with_base_url("http://flows.internal:8000")
///     .with_max_attempts(3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StreamConfig {
    /// Server origin, e.g. `http://127.0.0.1:8000`
    pub base_url: String,
    /// Reconnect attempts before giving up (default: 5)
    pub max_attempts: u32,
    /// Backoff unit; attempt k waits `base_delay * k` (default: 1s)
    pub base_delay: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl StreamConfig {
    /// Create a new StreamConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server origin.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the reconnect attempt ceiling.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the backoff unit.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Reconnect policy derived from this config.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts: self.max_attempts,
            base_delay: self.base_delay,
        }
    }

    /// URL of the event resource for `scope`, or of the global resource.
    ///
    /// Flow ids are inserted verbatim.
    pub fn endpoint_url(&self, scope: Option<&str>) -> String {
        let base = self.base_url.trim_end_matches('/');
        match scope {
            Some(flow_id) => format!("{}/api/sse/flows/{}/events", base, flow_id),
            None => format!("{}/api/sse/flows/events", base),
        }
    }

    /// Create config from environment variables.
    ///
    /// Reads `FLOWSTREAM_URL`, `FLOWSTREAM_MAX_RETRIES` and
    /// `FLOWSTREAM_RETRY_BASE_MS`. Unparseable numbers keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_URL).filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }

        if let Some(raw) = lookup(ENV_MAX_RETRIES) {
            match raw.trim().parse::<u32>() {
                Ok(n) => config.max_attempts = n,
                Err(_) => warn!(var = ENV_MAX_RETRIES, value = %raw, "Ignoring invalid value"),
            }
        }

        if let Some(raw) = lookup(ENV_RETRY_BASE_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.base_delay = Duration::from_millis(ms),
                Err(_) => warn!(var = ENV_RETRY_BASE_MS, value = %raw, "Ignoring invalid value"),
            }
        }

        config
    }
}
