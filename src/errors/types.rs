//! Classified error kinds and resource identifiers.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Resources the client knows how to name in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    SecurityGroup,
    FloatingIp,
}

impl ResourceKind {
    /// Singular, human-readable name ("security group").
    pub fn singular(&self) -> &'static str {
        match self {
            ResourceKind::SecurityGroup => "security group",
            ResourceKind::FloatingIp => "floating ip",
        }
    }

    /// Plural, human-readable name ("floating ips").
    pub fn plural(&self) -> &'static str {
        match self {
            ResourceKind::SecurityGroup => "security groups",
            ResourceKind::FloatingIp => "floating ips",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

/// Discriminant of [`ClassifiedError`], for matching without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    RateLimited,
    ResourceExhausted,
    QuotaExceeded,
    NotFound,
    Fault,
}

/// A provider failure normalized into one of a fixed set of kinds.
///
/// Display strings are part of the contract: callers match on them by substring.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifiedError {
    /// The provider asked us to slow down. The only retryable kind.
    #[error(
        "Too many requests{}",
        .retry_after.map(|d| format!(", retry after {}ms", d.as_millis())).unwrap_or_default()
    )]
    RateLimited { retry_after: Option<Duration> },

    /// No more units of the resource can be handed out.
    #[error("Zero {} available", .resource.plural())]
    ResourceExhausted { resource: ResourceKind },

    /// The tenant hit its limit for the resource.
    #[error("Maximum number of {} exceeded", .resource.plural())]
    QuotaExceeded { resource: ResourceKind },

    #[error("{resource} {id} not found")]
    NotFound { resource: ResourceKind, id: String },

    /// Catch-all carrying the provider's raw message.
    #[error("{message}")]
    Fault { message: String },
}

impl ClassifiedError {
    pub fn rate_limited(retry_after: Option<Duration>) -> Self {
        ClassifiedError::RateLimited { retry_after }
    }

    pub fn exhausted(resource: ResourceKind) -> Self {
        ClassifiedError::ResourceExhausted { resource }
    }

    pub fn quota_exceeded(resource: ResourceKind) -> Self {
        ClassifiedError::QuotaExceeded { resource }
    }

    pub fn not_found(resource: ResourceKind, id: impl Into<String>) -> Self {
        ClassifiedError::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn fault(message: impl Into<String>) -> Self {
        ClassifiedError::Fault {
            message: message.into(),
        }
    }

    /// Terminal error reported once the attempt ceiling is hit.
    pub fn attempts_exhausted(max_attempts: u32, target: &str) -> Self {
        ClassifiedError::fault(format!(
            "Maximum number of attempts ({}) reached sending request to {}",
            max_attempts, target
        ))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClassifiedError::RateLimited { .. } => ErrorKind::RateLimited,
            ClassifiedError::ResourceExhausted { .. } => ErrorKind::ResourceExhausted,
            ClassifiedError::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            ClassifiedError::NotFound { .. } => ErrorKind::NotFound,
            ClassifiedError::Fault { .. } => ErrorKind::Fault,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind() == ErrorKind::RateLimited
    }

    pub fn is_resource_exhausted(&self) -> bool {
        self.kind() == ErrorKind::ResourceExhausted
    }

    pub fn is_quota_exceeded(&self) -> bool {
        self.kind() == ErrorKind::QuotaExceeded
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_fault(&self) -> bool {
        self.kind() == ErrorKind::Fault
    }

    /// Provider retry hint, if this is a rate-limit error that carried one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ClassifiedError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// True when the error reports a missing resource.
pub fn is_not_found(err: &ClassifiedError) -> bool {
    err.is_not_found()
}

/// True when the error is the provider asking the client to back off.
pub fn is_rate_limited(err: &ClassifiedError) -> bool {
    err.is_rate_limited()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floating_ip_messages() {
        let err = ClassifiedError::exhausted(ResourceKind::FloatingIp);
        assert_eq!(err.to_string(), "Zero floating ips available");

        let err = ClassifiedError::quota_exceeded(ResourceKind::FloatingIp);
        assert_eq!(err.to_string(), "Maximum number of floating ips exceeded");
    }

    #[test]
    fn test_attempts_exhausted_message() {
        let err = ClassifiedError::attempts_exhausted(3, "DELETE /os-security-groups/1");
        assert!(err.is_fault());
        assert_eq!(
            err.to_string(),
            "Maximum number of attempts (3) reached sending request to DELETE /os-security-groups/1"
        );
    }

    #[test]
    fn test_not_found_message_and_predicate() {
        let err = ClassifiedError::not_found(ResourceKind::SecurityGroup, "test_group");
        assert_eq!(err.to_string(), "security group test_group not found");
        assert!(is_not_found(&err));
        assert!(!is_rate_limited(&err));
    }

    #[test]
    fn test_rate_limited_hint() {
        let err = ClassifiedError::rate_limited(Some(Duration::from_secs(2)));
        assert!(err.is_rate_limited());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));
        assert_eq!(err.to_string(), "Too many requests, retry after 2000ms");

        let err = ClassifiedError::rate_limited(None);
        assert_eq!(err.to_string(), "Too many requests");
        assert_eq!(err.retry_after(), None);
    }

    #[test]
    fn test_kind_is_exclusive() {
        let errors = [
            ClassifiedError::rate_limited(None),
            ClassifiedError::exhausted(ResourceKind::FloatingIp),
            ClassifiedError::quota_exceeded(ResourceKind::FloatingIp),
            ClassifiedError::not_found(ResourceKind::FloatingIp, "1"),
            ClassifiedError::fault("boom"),
        ];
        for err in &errors {
            let flags = [
                err.is_rate_limited(),
                err.is_resource_exhausted(),
                err.is_quota_exceeded(),
                err.is_not_found(),
                err.is_fault(),
            ];
            assert_eq!(flags.iter().filter(|f| **f).count(), 1, "{:?}", err);
        }
    }
}
