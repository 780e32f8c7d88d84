//! Retry logic.
//!
//! # Responsibilities
//! - Decide, per failed attempt, whether to retry, give up, or pass the error on
//! - Execute retries with the configured backoff
//! - Emit one retry notice per wait
//!
//! # State Machine
//! ```text
//! Attempting ──ok──────────────────────────────▶ Success
//!     │ RateLimited && attempt < max
//!     ▼
//! Retrying (notice, sleep, attempt += 1) ──────▶ Attempting
//!     │ RateLimited && attempt == max
//!     ▼
//! Exhausted ("Maximum number of attempts (n) reached ...")
//!
//! any other error ─────────────────────────────▶ Permanent (returned unchanged)
//! ```
//!
//! # Design Decisions
//! - Rate limiting is the only retryable condition
//! - Attempt counter lives in a per-call `RetryState`; nothing is shared between calls
//! - Each logical call is sequential; no parallel attempts

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RetryConfig;
use crate::errors::ClassifiedError;
use crate::observability::RetryLog;
use crate::resilience::backoff::Backoff;

/// Bounded-retry configuration, fixed for the lifetime of a client.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
    honor_retry_after: bool,
    max_delay: Duration,
}

impl RetryPolicy {
    /// A policy that ignores provider hints. `max_attempts` below 1 is raised to 1.
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            honor_retry_after: false,
            max_delay: Duration::MAX,
        }
    }

    /// Let Retry-After hints replace the backoff delay, capped at `max_delay`.
    pub fn honor_retry_after(mut self, max_delay: Duration) -> Self {
        self.honor_retry_after = true;
        self.max_delay = max_delay;
        self
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        let policy = Self::new(config.max_attempts, Backoff::from_config(config));
        if config.honor_retry_after {
            policy.honor_retry_after(Duration::from_millis(config.max_delay_ms))
        } else {
            policy
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Wait before the attempt following `attempt`.
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        match hint {
            Some(hint) if self.honor_retry_after => hint.min(self.max_delay),
            _ => self.backoff.delay_for(attempt),
        }
    }

    /// Feed a failed attempt into the state machine.
    pub fn step(&self, state: &mut RetryState, err: ClassifiedError, target: &str) -> RetryStep {
        state.last_error = Some(err.clone());

        if !err.is_rate_limited() {
            return RetryStep::Permanent(err);
        }
        if state.attempt >= self.max_attempts {
            return RetryStep::Exhausted(ClassifiedError::attempts_exhausted(
                self.max_attempts,
                target,
            ));
        }

        let delay = self.delay_for(state.attempt, err.retry_after());
        state.attempt += 1;
        RetryStep::Retry { delay }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Ephemeral per-call bookkeeping.
#[derive(Debug, Clone)]
pub struct RetryState {
    attempt: u32,
    started: Instant,
    last_error: Option<ClassifiedError>,
}

impl RetryState {
    pub fn new() -> Self {
        Self {
            attempt: 1,
            started: Instant::now(),
            last_error: None,
        }
    }

    /// 1-based index of the attempt in flight.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn last_error(&self) -> Option<&ClassifiedError> {
        self.last_error.as_ref()
    }
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of feeding one failure to [`RetryPolicy::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryStep {
    /// Wait, then try again.
    Retry { delay: Duration },
    /// Rate limited on the last permitted attempt.
    Exhausted(ClassifiedError),
    /// Not retryable; returned to the caller as is.
    Permanent(ClassifiedError),
}

/// Text of the notice logged before each wait.
pub fn retry_notice(delay: Duration) -> String {
    format!("Too many requests, retrying in {}ms", delay.as_millis())
}

/// Runs request-producing closures under a [`RetryPolicy`].
#[derive(Clone)]
pub struct Retrier {
    policy: RetryPolicy,
    log: Option<Arc<dyn RetryLog>>,
}

impl Retrier {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, log: None }
    }

    /// Send retry notices to `log`. Without a log, retries are silent.
    pub fn with_log(mut self, log: Arc<dyn RetryLog>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute `call` until it succeeds, fails permanently, or the attempt
    /// ceiling is reached. `call` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, target: &str, mut call: F) -> Result<T, ClassifiedError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ClassifiedError>>,
    {
        let mut state = RetryState::new();

        loop {
            let attempt = state.attempt();
            let err = match call(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            match self.policy.step(&mut state, err, target) {
                RetryStep::Retry { delay } => {
                    tracing::warn!(
                        target_request = %target,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limited, backing off"
                    );
                    if let Some(log) = &self.log {
                        log.retry_notice(&retry_notice(delay));
                    }
                    tokio::time::sleep(delay).await;
                }
                RetryStep::Exhausted(err) => {
                    tracing::error!(
                        target_request = %target,
                        attempts = attempt,
                        elapsed_ms = state.elapsed().as_millis() as u64,
                        "Retry attempts exhausted"
                    );
                    return Err(err);
                }
                RetryStep::Permanent(err) => {
                    tracing::debug!(target_request = %target, attempt, error = %err, "Request failed");
                    return Err(err);
                }
            }
        }
    }
}

impl fmt::Debug for Retrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrier")
            .field("policy", &self.policy)
            .field("log", &self.log.is_some())
            .finish()
    }
}
