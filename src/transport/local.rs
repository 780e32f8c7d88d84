//! In-process transport that drives the simulated service's router directly.

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{ACCEPT, CONTENT_TYPE, RETRY_AFTER};
use axum::http::Request;
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use crate::errors::ClassifiedError;
use crate::testservices::{self, Nova};
use crate::transport::{interpret, ApiRequest, Transport};

/// Bodies from the simulated service are small; this only guards against runaway handlers.
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Sends each request through the axum router with `oneshot`, no socket involved.
#[derive(Clone)]
pub struct RouterTransport {
    router: Router,
}

impl RouterTransport {
    pub fn new(nova: Arc<Nova>) -> Self {
        Self {
            router: testservices::http::router(nova),
        }
    }
}

impl Transport for RouterTransport {
    async fn send(&self, request: &ApiRequest) -> Result<Value, ClassifiedError> {
        let body = match &request.body {
            Some(value) => Body::from(serde_json::to_vec(value).map_err(|e| {
                ClassifiedError::fault(format!("failed to encode body for {}: {}", request, e))
            })?),
            None => Body::empty(),
        };

        let mut builder = Request::builder()
            .method(request.method.clone())
            .uri(request.path.as_str())
            .header(ACCEPT, "application/json");
        if request.body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        let http_request = builder.body(body).map_err(|e| {
            ClassifiedError::fault(format!("failed to build request {}: {}", request, e))
        })?;

        let response = match self.router.clone().oneshot(http_request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), MAX_BODY_BYTES)
            .await
            .map_err(|e| ClassifiedError::fault(format!("error reading response for {}: {}", request, e)))?;

        interpret(status, retry_after.as_deref(), &bytes, request)
    }
}
