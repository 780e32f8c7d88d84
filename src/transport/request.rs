//! Transport-neutral request description.

use std::fmt;

use axum::http::Method;
use serde_json::Value;

use crate::errors::ResourceKind;

/// One provider call, independent of how it is carried.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the compute endpoint, starting with '/'.
    pub path: String,
    pub body: Option<Value>,
    /// What the call operates on; used to classify failures.
    pub resource: ResourceKind,
    /// Identifier of the targeted object, if any.
    pub resource_id: Option<String>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>, resource: ResourceKind) -> Self {
        Self::new(Method::GET, path, resource)
    }

    pub fn post(path: impl Into<String>, resource: ResourceKind, body: Value) -> Self {
        let mut request = Self::new(Method::POST, path, resource);
        request.body = Some(body);
        request
    }

    pub fn delete(path: impl Into<String>, resource: ResourceKind) -> Self {
        Self::new(Method::DELETE, path, resource)
    }

    fn new(method: Method, path: impl Into<String>, resource: ResourceKind) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            resource,
            resource_id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    /// Id used in NotFound errors: the explicit id, else the path.
    pub fn subject(&self) -> &str {
        self.resource_id.as_deref().unwrap_or(&self.path)
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}
