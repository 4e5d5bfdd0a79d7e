//! Reconnection policy.
//!
//! After a transport error the client waits `base_delay × attempt` before
//! re-opening the same scope, for at most `max_attempts` attempts. Backoff is
//! linear, and exhaustion is silent: the controller just stops scheduling.

use std::time::Duration;

/// Default attempt ceiling.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default backoff unit.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before 1-indexed attempt `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Decision taken after a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Re-open after `delay`; `attempt` is 1-indexed
    Retry { attempt: u32, delay: Duration },
    /// Budget spent, no further automatic attempt
    GiveUp { attempts: u32 },
}

/// Tracks consecutive transport failures.
#[derive(Debug, Clone, Default)]
pub struct ReconnectController {
    policy: ReconnectPolicy,
    attempts: u32,
}

impl ReconnectController {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
        }
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Consecutive failures since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// A transport opened successfully.
    pub fn on_open(&mut self) {
        self.attempts = 0;
    }

    /// Reset without an open, e.g. on explicit disconnect.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Record a transport error and decide what to do next.
    pub fn on_error(&mut self) -> ReconnectDecision {
        if self.attempts >= self.policy.max_attempts {
            return ReconnectDecision::GiveUp {
                attempts: self.attempts,
            };
        }
        self.attempts += 1;
        ReconnectDecision::Retry {
            attempt: self.attempts,
            delay: self.policy.delay_for(self.attempts),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.policy.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delay_ms(decision: ReconnectDecision) -> Option<u128> {
        match decision {
            ReconnectDecision::Retry { delay, .. } => Some(delay.as_millis()),
            ReconnectDecision::GiveUp { .. } => None,
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_linear_backoff_then_give_up() {
        let mut controller = ReconnectController::default();

        let delays: Vec<Option<u128>> = (0..5).map(|_| delay_ms(controller.on_error())).collect();
        assert_eq!(
            delays,
            vec![Some(1000), Some(2000), Some(3000), Some(4000), Some(5000)]
        );
        assert!(controller.is_exhausted());

        assert_eq!(
            controller.on_error(),
            ReconnectDecision::GiveUp { attempts: 5 }
        );
        // Still given up, counter does not keep climbing
        assert_eq!(
            controller.on_error(),
            ReconnectDecision::GiveUp { attempts: 5 }
        );
    }

    #[test]
    fn test_open_resets_attempts() {
        let mut controller = ReconnectController::default();
        controller.on_error();
        controller.on_error();
        controller.on_error();
        assert_eq!(controller.attempts(), 3);

        controller.on_open();
        assert_eq!(controller.attempts(), 0);
        assert_eq!(
            controller.on_error(),
            ReconnectDecision::Retry {
                attempt: 1,
                delay: Duration::from_millis(1000)
            }
        );
    }

    #[test]
    fn test_reset_after_exhaustion() {
        let mut controller = ReconnectController::default();
        for _ in 0..6 {
            controller.on_error();
        }
        controller.reset();
        assert!(!controller.is_exhausted());
        assert_eq!(delay_ms(controller.on_error()), Some(1000));
    }

    #[test]
    fn test_custom_policy() {
        let mut controller = ReconnectController::new(ReconnectPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(250),
        });
        assert_eq!(delay_ms(controller.on_error()), Some(250));
        assert_eq!(delay_ms(controller.on_error()), Some(500));
        assert_eq!(delay_ms(controller.on_error()), None);
    }

    #[test]
    fn test_zero_attempts_never_retries() {
        let mut controller = ReconnectController::new(ReconnectPolicy {
            max_attempts: 0,
            base_delay: DEFAULT_BASE_DELAY,
        });
        assert_eq!(
            controller.on_error(),
            ReconnectDecision::GiveUp { attempts: 0 }
        );
    }
}
