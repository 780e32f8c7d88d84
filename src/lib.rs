//! Nova compute client with rate-limit retries and a fault-injectable
//! simulated service.

pub mod config;
pub mod errors;
pub mod lifecycle;
pub mod nova;
pub mod observability;
pub mod resilience;
pub mod testservices;
pub mod transport;

pub use config::ClientConfig;
pub use errors::{ClassifiedError, ErrorKind, ResourceKind};
pub use lifecycle::Shutdown;
pub use nova::{FloatingIp, NovaClient, SecurityGroup};
pub use resilience::{Backoff, Retrier, RetryPolicy, MAX_SEND_ATTEMPTS};
pub use testservices::{Nova, SimulatedServer};
pub use transport::{ApiRequest, HttpTransport, RouterTransport, Transport};
