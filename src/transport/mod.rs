//! Transport boundary.
//!
//! # Data Flow
//! ```text
//! ApiRequest (request.rs)
//!     → HttpTransport (http.rs, reqwest → real provider or SimulatedServer)
//!     | RouterTransport (local.rs, tower oneshot → simulated axum router, no socket)
//!     → status + Retry-After + body
//!     → interpret(): 2xx → JSON value, else errors::wire::classify_response
//! ```
//!
//! # Design Decisions
//! - The core only depends on `Transport::send`; HTTP details stay here
//! - Both transports classify through the same function, so tests exercise
//!   the production classification path

pub mod http;
pub mod local;
pub mod request;

use std::future::Future;

use serde_json::Value;

use crate::errors::wire::classify_response;
use crate::errors::ClassifiedError;

pub use self::http::HttpTransport;
pub use local::RouterTransport;
pub use request::ApiRequest;

/// Send one request, get one classified outcome.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &ApiRequest,
    ) -> impl Future<Output = Result<Value, ClassifiedError>> + Send;
}

/// Turn a raw response into a payload or a classified error.
pub(crate) fn interpret(
    status: u16,
    retry_after: Option<&str>,
    body: &[u8],
    request: &ApiRequest,
) -> Result<Value, ClassifiedError> {
    if !(200..300).contains(&status) {
        return Err(classify_response(
            status,
            retry_after,
            body,
            request.resource,
            request.subject(),
        ));
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| {
        ClassifiedError::fault(format!("invalid response body for {}: {}", request, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ResourceKind;

    #[test]
    fn test_interpret_success_and_empty() {
        let req = ApiRequest::delete("/os-floating-ips/1", ResourceKind::FloatingIp).with_id("1");
        assert_eq!(interpret(202, None, b"", &req), Ok(Value::Null));
        assert_eq!(
            interpret(200, None, br#"{"a":1}"#, &req),
            Ok(serde_json::json!({"a": 1}))
        );
    }

    #[test]
    fn test_interpret_garbage_is_fault() {
        let req = ApiRequest::get("/os-floating-ips", ResourceKind::FloatingIp);
        let err = interpret(200, None, b"<html>", &req).unwrap_err();
        assert!(err.is_fault());
        assert!(err.to_string().contains("GET /os-floating-ips"));
    }

    #[test]
    fn test_interpret_not_found_uses_request_id() {
        let req = ApiRequest::get("/os-floating-ips/5", ResourceKind::FloatingIp).with_id("5");
        let err = interpret(404, None, b"", &req).unwrap_err();
        assert_eq!(err, ClassifiedError::not_found(ResourceKind::FloatingIp, "5"));
    }
}
