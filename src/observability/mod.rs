//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! resilience/retries.rs
//!     → RetryLog sink (captured lines, asserted on by tests)
//!     → tracing events (structured fields: target, attempt, delay_ms)
//!
//! testservices/http.rs
//!     → tower-http TraceLayer spans with x-request-id
//! ```
//!
//! # Design Decisions
//! - Structured logging via tracing for diagnostics
//! - Retry notices are a contract, so they go through an explicit sink

pub mod logging;

pub use logging::{init_logging, MemoryLog, RetryLog, TracingLog};
