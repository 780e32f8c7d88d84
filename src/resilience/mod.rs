//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request from nova/client.rs:
//!     → retries.rs (Retrier::run drives attempts)
//!     → transport (one attempt, classified outcome)
//!     → On RateLimited: backoff.rs (delay for this attempt, or provider hint)
//!     → notice to RetryLog, sleep, next attempt
//! ```
//!
//! # Design Decisions
//! - Only rate limiting is retried; everything else surfaces on first occurrence
//! - Backoff is a pure function of the attempt index
//! - The attempt ceiling is a policy constant, not per-call input

pub mod backoff;
pub mod retries;

pub use backoff::Backoff;
pub use retries::{retry_notice, Retrier, RetryPolicy, RetryState, RetryStep};

/// Default attempt ceiling, first attempt included.
pub const MAX_SEND_ATTEMPTS: u32 = 3;
