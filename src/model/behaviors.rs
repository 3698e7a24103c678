//! Built-in interceptors.
//!
//! | Interceptor | Hook | Behavior |
//! |-------------|------|----------|
//! | [`Logging`] | both | logs every call with its elapsed time |
//! | [`RetryOnRecoverable`] | after | reissues calls failing with a recoverable error |
//! | [`AwaitReady`] | before | waits until the bound document finished loading |

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::driver::config::saturating_millis;
use crate::error::{Error, Result};

use super::intercept::{Flow, Interceptor, Invocation, Outcome};

// ============================================================================
// Logging
// ============================================================================

/// Logs every call and its outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logging;

#[async_trait]
impl Interceptor for Logging {
    fn name(&self) -> &str {
        "logging"
    }

    async fn before(&self, invocation: &Invocation) -> Result<()> {
        debug!(
            part = invocation.part(),
            method = invocation.method(),
            attempt = invocation.attempt(),
            "Invoking"
        );
        Ok(())
    }

    async fn after(&self, invocation: &Invocation, outcome: &mut Outcome) -> Flow {
        let elapsed_ms = saturating_millis(invocation.elapsed());
        match outcome {
            Ok(_) => debug!(
                part = invocation.part(),
                method = invocation.method(),
                elapsed_ms,
                "Invocation succeeded"
            ),
            Err(e) => warn!(
                part = invocation.part(),
                method = invocation.method(),
                elapsed_ms,
                error = %e,
                "Invocation failed"
            ),
        }
        Flow::Continue
    }
}

// ============================================================================
// RetryOnRecoverable
// ============================================================================

/// Reissues calls that fail with a recoverable error.
///
/// Recoverable errors are those for which
/// [`Error::is_recoverable`] holds: stale or changing elements and timeouts.
/// The delay doubles after every attempt, capped at `max_backoff`.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnRecoverable {
    attempts: u32,
    backoff: Duration,
    max_backoff: Duration,
}

impl Default for RetryOnRecoverable {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(100))
    }
}

impl RetryOnRecoverable {
    /// Allows up to `attempts` calls in total, waiting `backoff` before the
    /// first reissue.
    #[must_use]
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
            max_backoff: Duration::from_secs(5),
        }
    }

    /// Caps the delay between attempts.
    #[must_use]
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Total attempts allowed.
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay after `attempt` (1-based) failed.
    #[must_use]
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

#[async_trait]
impl Interceptor for RetryOnRecoverable {
    fn name(&self) -> &str {
        "retry-on-recoverable"
    }

    async fn after(&self, invocation: &Invocation, outcome: &mut Outcome) -> Flow {
        let Err(e) = outcome else {
            return Flow::Continue;
        };
        if !e.is_recoverable() || invocation.attempt() >= self.attempts {
            return Flow::Continue;
        }

        let delay = self.backoff_for_attempt(invocation.attempt());
        debug!(
            method = invocation.method(),
            attempt = invocation.attempt(),
            delay_ms = saturating_millis(delay),
            error = %e,
            "Retrying recoverable failure"
        );
        tokio::time::sleep(delay).await;
        Flow::Reissue
    }
}

// ============================================================================
// AwaitReady
// ============================================================================

/// Waits before every call until the bound document reports ready.
#[derive(Debug, Clone, Copy)]
pub struct AwaitReady {
    timeout: Duration,
}

impl Default for AwaitReady {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl AwaitReady {
    /// Waits at most `timeout` per call.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Interceptor for AwaitReady {
    fn name(&self) -> &str {
        "await-ready"
    }

    async fn before(&self, invocation: &Invocation) -> Result<()> {
        let Some(handle) = invocation.handle() else {
            return Ok(());
        };
        let interval = handle.session().configuration().poll_interval();
        let deadline = Instant::now().checked_add(self.timeout);

        loop {
            if handle.is_ready().await? {
                return Ok(());
            }
            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(Error::timeout(
                            format!("document ready on {}", handle.surface()),
                            saturating_millis(self.timeout),
                        ));
                    }
                    interval.min(deadline - now)
                }
                None => interval,
            };
            tokio::time::sleep(pause).await;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
