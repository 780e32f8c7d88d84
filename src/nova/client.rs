//! Compute API client.
//!
//! # Responsibilities
//! - Build resource requests and parse responses
//! - Run every request through the retry engine
//! - Surface classified errors with resource-specific meaning

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::config::ClientConfig;
use crate::errors::{ClassifiedError, ResourceKind};
use crate::nova::types::{
    FloatingIp, FloatingIpEnvelope, FloatingIpsEnvelope, SecurityGroup, SecurityGroupEnvelope,
    SecurityGroupsEnvelope,
};
use crate::observability::RetryLog;
use crate::resilience::{Retrier, RetryPolicy};
use crate::testservices::Nova;
use crate::transport::{ApiRequest, HttpTransport, RouterTransport, Transport};

/// Resource-level operations against a compute endpoint.
#[derive(Debug)]
pub struct NovaClient<T> {
    transport: T,
    retrier: Retrier,
}

impl NovaClient<HttpTransport> {
    /// HTTP client for `config.endpoint` with the configured retry policy.
    pub fn from_config(
        config: &ClientConfig,
        log: Option<Arc<dyn RetryLog>>,
    ) -> Result<Self, ClassifiedError> {
        let transport = HttpTransport::new(&config.endpoint, &config.timeouts)?;
        let mut retrier = Retrier::new(RetryPolicy::from_config(&config.retries));
        if let Some(log) = log {
            retrier = retrier.with_log(log);
        }

        tracing::info!(
            endpoint = %transport.endpoint(),
            max_attempts = config.retries.max_attempts,
            "Compute client initialized"
        );
        Ok(Self::new(transport, retrier))
    }
}

impl NovaClient<RouterTransport> {
    /// Client wired straight into a simulated service, no socket involved.
    pub fn in_process(nova: Arc<Nova>, retrier: Retrier) -> Self {
        Self::new(RouterTransport::new(nova), retrier)
    }
}

impl<T: Transport> NovaClient<T> {
    pub fn new(transport: T, retrier: Retrier) -> Self {
        Self { transport, retrier }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn retrier(&self) -> &Retrier {
        &self.retrier
    }

    async fn send(&self, request: ApiRequest) -> Result<Value, ClassifiedError> {
        let target = request.to_string();
        let transport = &self.transport;
        let request = &request;
        self.retrier
            .run(&target, move |_| transport.send(request))
            .await
    }

    fn decode<D: DeserializeOwned>(value: Value, what: &str) -> Result<D, ClassifiedError> {
        serde_json::from_value(value)
            .map_err(|e| ClassifiedError::fault(format!("failed to decode {}: {}", what, e)))
    }

    // --- Security groups ---

    pub async fn list_security_groups(&self) -> Result<Vec<SecurityGroup>, ClassifiedError> {
        let value = self
            .send(ApiRequest::get("/os-security-groups", ResourceKind::SecurityGroup))
            .await?;
        let envelope: SecurityGroupsEnvelope = Self::decode(value, "security groups")?;
        Ok(envelope.security_groups)
    }

    pub async fn security_group(&self, id: &str) -> Result<SecurityGroup, ClassifiedError> {
        let value = self
            .send(
                ApiRequest::get(format!("/os-security-groups/{}", id), ResourceKind::SecurityGroup)
                    .with_id(id),
            )
            .await?;
        let envelope: SecurityGroupEnvelope = Self::decode(value, "security group")?;
        Ok(envelope.security_group)
    }

    /// Look a group up by name. Missing groups are `NotFound` keyed by the name.
    pub async fn security_group_by_name(&self, name: &str) -> Result<SecurityGroup, ClassifiedError> {
        self.list_security_groups()
            .await?
            .into_iter()
            .find(|group| group.name == name)
            .ok_or_else(|| ClassifiedError::not_found(ResourceKind::SecurityGroup, name))
    }

    pub async fn create_security_group(
        &self,
        name: &str,
        description: &str,
    ) -> Result<SecurityGroup, ClassifiedError> {
        let body = json!({ "security_group": { "name": name, "description": description } });
        let value = self
            .send(ApiRequest::post("/os-security-groups", ResourceKind::SecurityGroup, body).with_id(name))
            .await?;
        let envelope: SecurityGroupEnvelope = Self::decode(value, "created security group")?;

        tracing::info!(id = %envelope.security_group.id, name = %name, "Security group created");
        Ok(envelope.security_group)
    }

    pub async fn delete_security_group(&self, id: &str) -> Result<(), ClassifiedError> {
        self.send(
            ApiRequest::delete(format!("/os-security-groups/{}", id), ResourceKind::SecurityGroup)
                .with_id(id),
        )
        .await?;

        tracing::info!(id = %id, "Security group deleted");
        Ok(())
    }

    // --- Floating ips ---

    pub async fn list_floating_ips(&self) -> Result<Vec<FloatingIp>, ClassifiedError> {
        let value = self
            .send(ApiRequest::get("/os-floating-ips", ResourceKind::FloatingIp))
            .await?;
        let envelope: FloatingIpsEnvelope = Self::decode(value, "floating ips")?;
        Ok(envelope.floating_ips)
    }

    pub async fn floating_ip(&self, id: &str) -> Result<FloatingIp, ClassifiedError> {
        let value = self
            .send(ApiRequest::get(format!("/os-floating-ips/{}", id), ResourceKind::FloatingIp).with_id(id))
            .await?;
        let envelope: FloatingIpEnvelope = Self::decode(value, "floating ip")?;
        Ok(envelope.floating_ip)
    }

    /// Allocate an address from the default pool.
    ///
    /// Fails with "Zero floating ips available" when the pool is empty and
    /// "Maximum number of floating ips exceeded" when the tenant is at quota;
    /// neither is retried.
    pub async fn allocate_floating_ip(&self) -> Result<FloatingIp, ClassifiedError> {
        let value = self
            .send(ApiRequest::post("/os-floating-ips", ResourceKind::FloatingIp, json!({})))
            .await?;
        let envelope: FloatingIpEnvelope = Self::decode(value, "allocated floating ip")?;
        let ip = envelope.floating_ip;
        if ip.ip.is_empty() {
            return Err(ClassifiedError::fault(format!(
                "allocated floating ip {} has no address",
                ip.id
            )));
        }

        tracing::info!(id = %ip.id, ip = %ip.ip, "Floating ip allocated");
        Ok(ip)
    }

    pub async fn delete_floating_ip(&self, id: &str) -> Result<(), ClassifiedError> {
        self.send(
            ApiRequest::delete(format!("/os-floating-ips/{}", id), ResourceKind::FloatingIp).with_id(id),
        )
        .await?;

        tracing::info!(id = %id, "Floating ip released");
        Ok(())
    }
}
