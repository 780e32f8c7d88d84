//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     ctrl-c or SimulatedServer::stop → trigger → every subscriber's recv() resolves
//!     → axum::serve drains in-flight requests → task exits
//! ```

pub mod shutdown;

pub use shutdown::{wait_for_signal, Shutdown};
