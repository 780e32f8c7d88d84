//! HTTP surface of the simulated service.
//!
//! # Routes
//! ```text
//! GET    /os-security-groups        → allSecurityGroups
//! POST   /os-security-groups        → addSecurityGroup
//! GET    /os-security-groups/{id}   → securityGroup
//! DELETE /os-security-groups/{id}   → removeSecurityGroup
//! GET    /os-floating-ips           → allFloatingIPs
//! POST   /os-floating-ips           → addFloatingIP
//! GET    /os-floating-ips/{id}      → floatingIP
//! DELETE /os-floating-ips/{id}      → removeFloatingIP
//! ```

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::errors::wire::encode;
use crate::errors::ClassifiedError;
use crate::testservices::nova::Nova;

/// A classified error on its way out of a handler.
#[derive(Debug)]
pub struct ServiceFault(pub ClassifiedError);

impl From<ClassifiedError> for ServiceFault {
    fn from(err: ClassifiedError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ServiceFault {
    fn into_response(self) -> Response {
        let encoded = encode(&self.0);
        let status = StatusCode::from_u16(encoded.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(encoded.body)).into_response();
        if let Some(secs) = encoded.retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

type HandlerResult = Result<Response, ServiceFault>;

#[derive(Debug, Deserialize)]
struct CreateGroupRequest {
    security_group: NewGroup,
}

#[derive(Debug, Deserialize)]
struct NewGroup {
    name: String,
    #[serde(default)]
    description: String,
}

/// Build the router for one service instance.
pub fn router(nova: Arc<Nova>) -> Router {
    Router::new()
        .route("/os-security-groups", get(list_groups).post(create_group))
        .route("/os-security-groups/{id}", get(show_group).delete(delete_group))
        .route("/os-floating-ips", get(list_floating_ips).post(allocate_floating_ip))
        .route(
            "/os-floating-ips/{id}",
            get(show_floating_ip).delete(delete_floating_ip),
        )
        .with_state(nova)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

async fn list_groups(State(nova): State<Arc<Nova>>) -> HandlerResult {
    let groups = nova.all_security_groups()?;
    Ok(Json(json!({ "security_groups": groups })).into_response())
}

async fn create_group(State(nova): State<Arc<Nova>>, body: Bytes) -> HandlerResult {
    let request: CreateGroupRequest = serde_json::from_slice(&body)
        .map_err(|e| ClassifiedError::fault(format!("Invalid security group request: {}", e)))?;
    let group = nova.add_security_group(&request.security_group.name, &request.security_group.description)?;

    tracing::debug!(name = %group.name, id = %group.id, "Security group created");
    Ok(Json(json!({ "security_group": group })).into_response())
}

async fn show_group(State(nova): State<Arc<Nova>>, Path(id): Path<String>) -> HandlerResult {
    let group = nova.security_group(&id)?;
    Ok(Json(json!({ "security_group": group })).into_response())
}

async fn delete_group(State(nova): State<Arc<Nova>>, Path(id): Path<String>) -> HandlerResult {
    nova.remove_security_group(&id)?;
    Ok(StatusCode::ACCEPTED.into_response())
}

async fn list_floating_ips(State(nova): State<Arc<Nova>>) -> HandlerResult {
    let ips = nova.all_floating_ips()?;
    Ok(Json(json!({ "floating_ips": ips })).into_response())
}

async fn allocate_floating_ip(State(nova): State<Arc<Nova>>, body: Bytes) -> HandlerResult {
    if !body.is_empty() {
        // Pool selection is accepted but there is only one pool.
        let _: Value = serde_json::from_slice(&body)
            .map_err(|e| ClassifiedError::fault(format!("Invalid floating ip request: {}", e)))?;
    }
    let ip = nova.add_floating_ip()?;

    tracing::debug!(ip = %ip.ip, id = %ip.id, "Floating ip allocated");
    Ok(Json(json!({ "floating_ip": ip })).into_response())
}

async fn show_floating_ip(State(nova): State<Arc<Nova>>, Path(id): Path<String>) -> HandlerResult {
    let ip = nova.floating_ip(&id)?;
    Ok(Json(json!({ "floating_ip": ip })).into_response())
}

async fn delete_floating_ip(State(nova): State<Arc<Nova>>, Path(id): Path<String>) -> HandlerResult {
    nova.remove_floating_ip(&id)?;
    Ok(StatusCode::ACCEPTED.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ResourceKind;
    use crate::testservices::control::{always, ServiceControl};
    use crate::testservices::nova::ADD_FLOATING_IP;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    async fn call(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, Option<String>, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, retry_after, value)
    }

    #[tokio::test]
    async fn test_create_and_list_groups() {
        let nova = Arc::new(Nova::default());
        let app = router(nova.clone());

        let (status, _, body) = call(
            app.clone(),
            "POST",
            "/os-security-groups",
            r#"{"security_group": {"name": "web", "description": "web tier"}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["security_group"]["name"], "web");

        let (status, _, body) = call(app, "GET", "/os-security-groups", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["security_groups"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_missing_group_is_404() {
        let app = router(Arc::new(Nova::default()));
        let (status, _, body) = call(app, "DELETE", "/os-security-groups/42", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["itemNotFound"]["message"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_injected_rate_limit_has_retry_after() {
        let nova = Arc::new(Nova::default());
        nova.register_control_point(
            ADD_FLOATING_IP,
            Some(always(ClassifiedError::rate_limited(Some(Duration::from_secs(3))))),
        );
        let (status, retry_after, body) = call(router(nova), "POST", "/os-floating-ips", "").await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(retry_after.as_deref(), Some("3"));
        assert_eq!(body["overLimit"]["retryAfter"], 3);
    }

    #[tokio::test]
    async fn test_injected_exhaustion_body() {
        let nova = Arc::new(Nova::default());
        nova.register_control_point(
            ADD_FLOATING_IP,
            Some(always(ClassifiedError::exhausted(ResourceKind::FloatingIp))),
        );
        let (status, retry_after, body) = call(router(nova), "POST", "/os-floating-ips", "{}").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(retry_after.is_none());
        assert_eq!(body["itemNotFound"]["message"], "Zero floating ips available");
    }

    #[tokio::test]
    async fn test_malformed_group_request() {
        let app = router(Arc::new(Nova::default()));
        let (status, _, body) = call(app, "POST", "/os-security-groups", "{").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["computeFault"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid security group request"));
    }
}
