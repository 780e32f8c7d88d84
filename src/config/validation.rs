//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (attempts >= 1, timeouts > 0, pool not empty)
//! - Check the endpoint is a usable URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::ClientConfig;
use crate::testservices::nova::MAX_POOL_SIZE;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("retries.max_attempts must be at least 1")]
    NoAttempts,

    #[error("retries.max_delay_ms ({max}) is below retries.base_delay_ms ({base})")]
    DelayBounds { base: u64, max: u64 },

    #[error("timeouts.request_secs must be greater than 0")]
    ZeroRequestTimeout,

    #[error("service.floating_ip_pool_size must be greater than 0")]
    EmptyPool,

    #[error("service.floating_ip_pool_size {size} exceeds the limit of {max}")]
    PoolTooLarge { size: usize, max: usize },

    #[error("invalid service.bind_address '{0}'")]
    InvalidBindAddress(String),
}

pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match url::Url::parse(&config.endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::InvalidEndpoint {
            endpoint: config.endpoint.clone(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidEndpoint {
            endpoint: config.endpoint.clone(),
            reason: e.to_string(),
        }),
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::NoAttempts);
    }
    if config.retries.max_delay_ms < config.retries.base_delay_ms {
        errors.push(ValidationError::DelayBounds {
            base: config.retries.base_delay_ms,
            max: config.retries.max_delay_ms,
        });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.service.floating_ip_pool_size == 0 {
        errors.push(ValidationError::EmptyPool);
    }
    if config.service.floating_ip_pool_size > MAX_POOL_SIZE {
        errors.push(ValidationError::PoolTooLarge {
            size: config.service.floating_ip_pool_size,
            max: MAX_POOL_SIZE,
        });
    }
    if config
        .service
        .bind_address
        .parse::<std::net::SocketAddr>()
        .is_err()
    {
        errors.push(ValidationError::InvalidBindAddress(
            config.service.bind_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = ClientConfig::default();
        config.endpoint = "ftp://nowhere".to_string();
        config.retries.max_attempts = 0;
        config.retries.base_delay_ms = 500;
        config.retries.max_delay_ms = 100;
        config.timeouts.request_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::NoAttempts));
        assert!(errors.contains(&ValidationError::ZeroRequestTimeout));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidEndpoint { .. })));
    }

    #[test]
    fn test_bad_bind_address() {
        let mut config = ClientConfig::default();
        config.service.bind_address = "not-an-addr".to_string();
        config.service.floating_ip_pool_size = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyPool,
                ValidationError::InvalidBindAddress("not-an-addr".to_string()),
            ]
        );
    }

    #[test]
    fn test_pool_size_limit() {
        let mut config = ClientConfig::default();
        config.service.floating_ip_pool_size = MAX_POOL_SIZE;
        assert!(validate_config(&config).is_ok());

        config.service.floating_ip_pool_size = MAX_POOL_SIZE + 1;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::PoolTooLarge {
                size: MAX_POOL_SIZE + 1,
                max: MAX_POOL_SIZE,
            }]
        );
    }
}
