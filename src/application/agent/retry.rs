//! Credential rotation and rate-limit recovery.

use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_RATE_LIMIT_THRESHOLD: u32 = 3;
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(60);

/// Immutable, ordered credential list.
///
/// Keys are loaded once at startup and never removed, even after the provider
/// marks one invalid; the rotation cursor lives in [`RetryController`], not
/// here and not in any global.
#[derive(Debug, Clone)]
pub struct CredentialPool {
    keys: Vec<String>,
}

impl CredentialPool {
    pub fn new(keys: Vec<String>) -> Self {
        let keys = keys
            .into_iter()
            .filter(|key| !key.trim().is_empty())
            .collect();
        Self { keys }
    }

    /// Numbered keys first (`{prefix}_1`, `{prefix}_2`, ...), then the bare
    /// `{prefix}` variable as a single-key fallback.
    pub fn from_env(prefix: &str) -> Self {
        let mut keys = Vec::new();
        for index in 1.. {
            match std::env::var(format!("{prefix}_{index}")) {
                Ok(value) => keys.push(value),
                Err(_) => break,
            }
        }
        if keys.is_empty() {
            if let Ok(value) = std::env::var(prefix) {
                keys.push(value);
            }
        }
        Self::new(keys)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn key(&self, cursor: usize) -> &str {
        &self.keys[cursor % self.keys.len()]
    }
}

/// What the loop should do about a recoverable provider failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDirective {
    /// Rebuild the provider with this credential and replay the conversation.
    Rotate { credential: String },
    /// Every credential is saturated; wait it out, then retry in place.
    Backoff { delay: Duration },
    /// The whole pool was rejected within one escalation window.
    GiveUp,
}

/// Tracks the rotation cursor and the consecutive-failure counter for one run.
///
/// Decisions are pure state transitions; sleeping and provider rebuilding are
/// the caller's job, which keeps this testable without a runtime.
#[derive(Debug)]
pub struct RetryController {
    pool: CredentialPool,
    cursor: usize,
    consecutive_failures: u32,
    rate_limit_threshold: u32,
    default_backoff: Duration,
}

impl RetryController {
    pub fn new(pool: CredentialPool) -> Self {
        Self {
            pool,
            cursor: 0,
            consecutive_failures: 0,
            rate_limit_threshold: DEFAULT_RATE_LIMIT_THRESHOLD,
            default_backoff: DEFAULT_BACKOFF,
        }
    }

    pub fn current(&self) -> &str {
        self.pool.key(self.cursor)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// A successful exchange ends the failure streak.
    pub fn on_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Rate limit: rotate below the threshold, otherwise back off for the
    /// server-suggested delay and start a fresh streak.
    pub fn on_rate_limit(&mut self, retry_after: Option<Duration>) -> RetryDirective {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.rate_limit_threshold {
            let delay = retry_after.unwrap_or(self.default_backoff);
            warn!(
                delay_secs = delay.as_secs(),
                "All credentials rate limited; backing off"
            );
            self.consecutive_failures = 0;
            return RetryDirective::Backoff { delay };
        }
        self.advance()
    }

    /// Invalid credential: rotate until the streak covers the whole pool.
    pub fn on_invalid_credential(&mut self) -> RetryDirective {
        self.consecutive_failures += 1;
        if self.consecutive_failures as usize >= self.pool.len() {
            warn!("Every credential in the pool was rejected");
            return RetryDirective::GiveUp;
        }
        self.advance()
    }

    fn advance(&mut self) -> RetryDirective {
        self.cursor = (self.cursor + 1) % self.pool.len();
        info!(slot = self.cursor + 1, "Rotated to next credential");
        RetryDirective::Rotate {
            credential: self.current().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> CredentialPool {
        CredentialPool::new(vec![
            "key-a".to_string(),
            "key-b".to_string(),
            "key-c".to_string(),
        ])
    }

    #[test]
    fn pool_drops_blank_keys() {
        let pool = CredentialPool::new(vec!["".to_string(), " ".to_string(), "k".to_string()]);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn env_pool_loads_numbered_keys_then_bare_fallback() {
        unsafe {
            std::env::set_var("STEPLOOP_POOL_A_1", "one");
            std::env::set_var("STEPLOOP_POOL_A_2", "two");
            std::env::set_var("STEPLOOP_POOL_B", "solo");
        }

        let numbered = CredentialPool::from_env("STEPLOOP_POOL_A");
        assert_eq!(numbered.len(), 2);
        assert_eq!(RetryController::new(numbered).current(), "one");

        let bare = CredentialPool::from_env("STEPLOOP_POOL_B");
        assert_eq!(bare.len(), 1);

        assert!(CredentialPool::from_env("STEPLOOP_POOL_C").is_empty());
    }

    #[test]
    fn rate_limits_rotate_then_back_off_at_threshold() {
        let mut controller = RetryController::new(pool());
        assert_eq!(controller.current(), "key-a");

        assert_eq!(
            controller.on_rate_limit(None),
            RetryDirective::Rotate {
                credential: "key-b".to_string()
            }
        );
        assert_eq!(
            controller.on_rate_limit(None),
            RetryDirective::Rotate {
                credential: "key-c".to_string()
            }
        );

        // Third consecutive signal sleeps instead of rotating again, and the
        // streak counter resets afterwards.
        assert_eq!(
            controller.on_rate_limit(Some(Duration::from_secs(42))),
            RetryDirective::Backoff {
                delay: Duration::from_secs(42)
            }
        );
        assert_eq!(controller.consecutive_failures(), 0);
    }

    #[test]
    fn backoff_uses_default_when_payload_has_no_delay() {
        let mut controller = RetryController::new(pool());
        controller.on_rate_limit(None);
        controller.on_rate_limit(None);
        assert_eq!(
            controller.on_rate_limit(None),
            RetryDirective::Backoff {
                delay: DEFAULT_BACKOFF
            }
        );
    }

    #[test]
    fn success_resets_the_streak() {
        let mut controller = RetryController::new(pool());
        controller.on_rate_limit(None);
        controller.on_rate_limit(None);
        controller.on_success();

        // Fresh streak: rotation resumes instead of backing off.
        assert!(matches!(
            controller.on_rate_limit(None),
            RetryDirective::Rotate { .. }
        ));
    }

    #[test]
    fn invalid_credentials_exhaust_the_pool() {
        let mut controller = RetryController::new(pool());
        assert!(matches!(
            controller.on_invalid_credential(),
            RetryDirective::Rotate { .. }
        ));
        assert!(matches!(
            controller.on_invalid_credential(),
            RetryDirective::Rotate { .. }
        ));
        assert_eq!(controller.on_invalid_credential(), RetryDirective::GiveUp);
    }

    #[test]
    fn rotation_wraps_around_the_pool() {
        let mut controller = RetryController::new(CredentialPool::new(vec![
            "only-a".to_string(),
            "only-b".to_string(),
        ]));
        controller.advance();
        assert_eq!(controller.current(), "only-b");
        controller.advance();
        assert_eq!(controller.current(), "only-a");
    }
}
