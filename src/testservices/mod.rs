//! Simulated provider for deterministic tests.
//!
//! # Data Flow
//! ```text
//! Transport (HttpTransport over SimulatedServer, or RouterTransport in-process)
//!     → http.rs (axum router, one handler per operation)
//!     → nova.rs (operation)
//!         → control.rs (hook registered under the operation name?)
//!             Err(ClassifiedError) → returned immediately, state untouched
//!             Ok(())               → operation runs against in-memory state
//!     → http.rs (ServiceFault → errors::wire::encode → status + body)
//! ```
//!
//! # Design Decisions
//! - Control points are owned by each service instance, never process-wide,
//!   so parallel tests with separate instances do not interfere
//! - Registry and resource state each sit behind their own mutex
//! - Both numeric and string identifier schemes are supported

pub mod control;
pub mod http;
pub mod nova;
pub mod server;

pub use control::{
    always, counted, fail_times, processor, CallCounter, ControlPoints, ControlProcessor,
    ServiceControl,
};
pub use nova::Nova;
pub use server::SimulatedServer;
