//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → RetryPolicy / HttpTransport / Nova built from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the attempt ceiling is fixed per client
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::BackoffStrategy;
pub use schema::ClientConfig;
pub use schema::IdMode;
pub use schema::RetryConfig;
pub use schema::ServiceConfig;
