//! Error taxonomy subsystem.
//!
//! # Data Flow
//! ```text
//! Provider (or simulated service) HTTP response
//!     → wire.rs (status + Retry-After + fault body → ClassifiedError)
//!     → resilience/retries.rs (only asks: is this RateLimited?)
//!     → nova/client.rs (caller sees the same ClassifiedError)
//!
//! Simulated service:
//!     ClassifiedError (returned by an operation or a control point)
//!     → wire.rs (ClassifiedError → status + headers + fault body)
//! ```
//!
//! # Design Decisions
//! - Closed enum of kinds; callers dispatch on `kind()` or the predicates
//! - Classification happens exactly once, at the transport boundary
//! - Mapping is total: anything unrecognised becomes `Fault` with the raw message
//! - Messages are stable and substring-matchable

pub mod types;
pub mod wire;

pub use types::{is_not_found, is_rate_limited, ClassifiedError, ErrorKind, ResourceKind};
