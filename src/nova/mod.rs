//! Compute API client.
//!
//! # Data Flow
//! ```text
//! NovaClient operation
//!     → ApiRequest (method, path, resource, subject)
//!     → Retrier::run (resilience/retries.rs)
//!         → Transport::send (HttpTransport or RouterTransport)
//!         → RateLimited? wait and resend, up to the attempt ceiling
//!     → typed resource (types.rs) or ClassifiedError
//! ```

pub mod client;
pub mod types;

pub use client::NovaClient;
pub use types::{FloatingIp, SecurityGroup};
