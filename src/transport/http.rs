//! HTTP/JSON transport over reqwest.

use std::time::Duration;

use reqwest::header::{ACCEPT, RETRY_AFTER};
use serde_json::Value;

use crate::config::schema::TimeoutConfig;
use crate::errors::ClassifiedError;
use crate::transport::{interpret, ApiRequest, Transport};

/// Sends requests to a compute endpoint over the network.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Build a transport for `endpoint` with per-attempt timeouts.
    pub fn new(endpoint: &str, timeouts: &TimeoutConfig) -> Result<Self, ClassifiedError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .build()
            .map_err(|e| ClassifiedError::fault(format!("failed to build HTTP client: {}", e)))?;
        Self::with_client(client, endpoint)
    }

    /// Use an existing reqwest client (shared pools, custom TLS, ...).
    pub fn with_client(client: reqwest::Client, endpoint: &str) -> Result<Self, ClassifiedError> {
        let parsed = url::Url::parse(endpoint)
            .map_err(|e| ClassifiedError::fault(format!("invalid endpoint '{}': {}", endpoint, e)))?;

        Ok(Self {
            client,
            endpoint: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<Value, ClassifiedError> {
        let url = self.url_for(&request.path);
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| ClassifiedError::fault(format!("invalid method {}: {}", request.method, e)))?;

        let mut builder = self
            .client
            .request(method, &url)
            .header(ACCEPT, "application/json");
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(url = %url, method = %request.method, "Sending request");

        let response = builder.send().await.map_err(|e| {
            ClassifiedError::fault(format!("error sending request to {}: {}", url, e))
        })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(|e| {
            ClassifiedError::fault(format!("error reading response from {}: {}", url, e))
        })?;

        interpret(status, retry_after.as_deref(), &bytes, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ResourceKind;

    #[test]
    fn test_endpoint_normalized() {
        let transport =
            HttpTransport::new("http://127.0.0.1:8774/v2/tenant/", &TimeoutConfig::default()).unwrap();
        assert_eq!(transport.endpoint(), "http://127.0.0.1:8774/v2/tenant");
        assert_eq!(
            transport.url_for("/os-floating-ips"),
            "http://127.0.0.1:8774/v2/tenant/os-floating-ips"
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = HttpTransport::new("not a url", &TimeoutConfig::default()).unwrap_err();
        assert!(err.to_string().contains("invalid endpoint"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_fault() {
        // Nothing listens on port 9 (discard) locally.
        let transport = HttpTransport::new(
            "http://127.0.0.1:9",
            &TimeoutConfig {
                connect_secs: 1,
                request_secs: 2,
            },
        )
        .unwrap();
        let err = transport
            .send(&ApiRequest::get("/os-floating-ips", ResourceKind::FloatingIp))
            .await
            .unwrap_err();
        assert!(err.is_fault());
        assert!(err.to_string().contains("error sending request"));
    }
}
