//! HTTP representation of classified errors.
//!
//! Faults travel as nova-style bodies: a single top-level key naming the fault
//! (`itemNotFound`, `overLimit`, `computeFault`, ...) wrapping `code`, `message`
//! and, for rate limits, `retryAfter`. Rate limits also carry a `Retry-After`
//! header in whole seconds.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::types::{ClassifiedError, ResourceKind};

pub const RETRY_AFTER: &str = "retry-after";

pub const NOT_FOUND_KEY: &str = "itemNotFound";
pub const OVER_LIMIT_KEY: &str = "overLimit";
pub const COMPUTE_FAULT_KEY: &str = "computeFault";

/// Inner object of a fault body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultDetail {
    pub code: u16,
    pub message: String,
    #[serde(rename = "retryAfter", default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// A classified error rendered for the wire.
#[derive(Debug, Clone)]
pub struct EncodedFault {
    pub status: u16,
    /// Value for the `Retry-After` header, in seconds.
    pub retry_after: Option<u64>,
    pub body: Value,
}

/// Render an error the way the provider would send it.
pub fn encode(err: &ClassifiedError) -> EncodedFault {
    let (status, key, retry_after) = match err {
        ClassifiedError::RateLimited { retry_after } => {
            (429, OVER_LIMIT_KEY, retry_after.map(whole_seconds))
        }
        ClassifiedError::QuotaExceeded { .. } => (413, OVER_LIMIT_KEY, None),
        ClassifiedError::ResourceExhausted { .. } | ClassifiedError::NotFound { .. } => {
            (404, NOT_FOUND_KEY, None)
        }
        ClassifiedError::Fault { .. } => (500, COMPUTE_FAULT_KEY, None),
    };

    let detail = FaultDetail {
        code: status,
        message: err.to_string(),
        retry_after,
    };
    let mut body = serde_json::Map::new();
    body.insert(
        key.to_string(),
        serde_json::to_value(detail).unwrap_or(Value::Null),
    );

    EncodedFault {
        status,
        retry_after,
        body: Value::Object(body),
    }
}

fn whole_seconds(d: Duration) -> u64 {
    let secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        secs.saturating_add(1)
    } else {
        secs
    }
}

/// Classify a non-success response. Total: every input maps to exactly one kind.
///
/// `resource` and `resource_id` come from the request that produced the
/// response, since provider bodies rarely say which object they refer to.
pub fn classify_response(
    status: u16,
    retry_after_header: Option<&str>,
    body: &[u8],
    resource: ResourceKind,
    resource_id: &str,
) -> ClassifiedError {
    let fault = parse_fault(body);
    let message = fault
        .as_ref()
        .map(|(_, message, _)| message.clone())
        .or_else(|| raw_text(body))
        .unwrap_or_else(|| status_reason(status));

    match status {
        429 | 413 if status == 429 || retry_after_header.is_some() || has_hint(&fault) => {
            let hint = retry_after_header
                .and_then(parse_retry_after)
                .or_else(|| fault.as_ref().and_then(|(_, _, hint)| *hint));
            ClassifiedError::rate_limited(hint)
        }
        413 => ClassifiedError::quota_exceeded(resource),
        404 if announces_exhaustion(&message) => ClassifiedError::exhausted(resource),
        404 => ClassifiedError::not_found(resource, resource_id),
        _ => ClassifiedError::fault(message),
    }
}

fn has_hint(fault: &Option<(String, String, Option<Duration>)>) -> bool {
    matches!(fault, Some((_, _, Some(_))))
}

/// Extract `(fault key, message, retryAfter)` from a nova-style body.
fn parse_fault(body: &[u8]) -> Option<(String, String, Option<Duration>)> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let (key, inner) = value.as_object()?.iter().next()?;
    let message = inner.get("message")?.as_str()?.to_string();
    let hint = inner.get("retryAfter").and_then(|v| match v {
        Value::Number(n) => n.as_u64().map(Duration::from_secs),
        Value::String(s) => parse_retry_after(s),
        _ => None,
    });
    Some((key.clone(), message, hint))
}

fn raw_text(body: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn status_reason(status: u16) -> String {
    match axum::http::StatusCode::from_u16(status) {
        Ok(code) => code
            .canonical_reason()
            .map(|r| format!("{} {}", status, r))
            .unwrap_or_else(|| status.to_string()),
        Err(_) => format!("unexpected status {}", status),
    }
}

/// Parse a `Retry-After` value given in (possibly fractional) seconds.
/// HTTP-date values and values too large for a `Duration` yield `None`.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    if secs >= 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

fn announces_exhaustion(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    (lower.starts_with("zero ") && lower.contains("available")) || lower.starts_with("no more ")
}
