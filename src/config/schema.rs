//! Configuration schema definitions.
//!
//! This module defines the configuration structure for the client and the
//! simulated service. All types derive Serde traits for deserialization from
//! config files.

use serde::{Deserialize, Serialize};

use crate::resilience::MAX_SEND_ATTEMPTS;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Compute endpoint, including any version/tenant prefix
    /// (e.g., "http://127.0.0.1:8774/v2/tenant").
    pub endpoint: String,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Simulated service settings.
    pub service: ServiceConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8774".to_string(),
            retries: RetryConfig::default(),
            timeouts: TimeoutConfig::default(),
            service: ServiceConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// How the delay between attempts grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Always wait `base_delay_ms`.
    Fixed,
    /// `base_delay_ms * 2^(attempt-1)`, capped at `max_delay_ms`.
    Exponential,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum attempts per logical request, first attempt included.
    pub max_attempts: u32,

    pub strategy: BackoffStrategy,

    /// Base delay in milliseconds.
    pub base_delay_ms: u64,

    /// Upper bound on any single wait, hints included, in milliseconds.
    pub max_delay_ms: u64,

    /// Add up to 10% random jitter to exponential delays.
    pub jitter: bool,

    /// Let a provider Retry-After hint replace the computed delay.
    pub honor_retry_after: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_SEND_ATTEMPTS,
            strategy: BackoffStrategy::Exponential,
            base_delay_ms: 100,
            max_delay_ms: 2000,
            jitter: false,
            honor_retry_after: true,
        }
    }
}

/// Timeout configuration for outbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Per-attempt request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Identifier scheme used by the simulated service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdMode {
    /// JSON numbers: 1, 2, 3, ...
    Numeric,
    /// UUID v4 strings.
    String,
}

/// Simulated service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Bind address for the standalone server.
    pub bind_address: String,

    pub id_mode: IdMode,

    /// Name of the floating ip pool.
    pub floating_ip_pool: String,

    /// Number of addresses the pool can hand out.
    pub floating_ip_pool_size: usize,

    /// Tenant limit on allocated floating ips (none = pool size only).
    pub floating_ip_quota: Option<usize>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8774".to_string(),
            id_mode: IdMode::Numeric,
            floating_ip_pool: "nova".to_string(),
            floating_ip_pool_size: 254,
            floating_ip_quota: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
