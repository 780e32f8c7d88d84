//! In-memory compute service double.
//!
//! Holds security groups and floating ips for the lifetime of one test case.
//! Every operation consults the control point of the same name first.

use std::fmt;
use std::sync::Mutex;

use serde::Serialize;
use serde_json::Value;

use crate::config::{IdMode, ServiceConfig};
use crate::errors::{ClassifiedError, ResourceKind};
use crate::testservices::control::{ControlPoints, ServiceControl};

pub const ADD_SECURITY_GROUP: &str = "addSecurityGroup";
pub const REMOVE_SECURITY_GROUP: &str = "removeSecurityGroup";
pub const SECURITY_GROUP: &str = "securityGroup";
pub const ALL_SECURITY_GROUPS: &str = "allSecurityGroups";
pub const ADD_FLOATING_IP: &str = "addFloatingIP";
pub const REMOVE_FLOATING_IP: &str = "removeFloatingIP";
pub const FLOATING_IP: &str = "floatingIP";
pub const ALL_FLOATING_IPS: &str = "allFloatingIPs";

pub const DEFAULT_GROUP: &str = "default";

/// Addresses are carved from 10.0.0.0/8, so larger pools would repeat.
pub const MAX_POOL_SIZE: usize = 0xff_ffff;

/// Identifier as it appears on the wire: a JSON number or a JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResourceId {
    Numeric(u64),
    Text(String),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Numeric(n) => write!(f, "{}", n),
            ResourceId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SecurityGroupRecord {
    pub id: ResourceId,
    pub name: String,
    pub description: String,
    pub tenant_id: String,
    pub rules: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FloatingIpRecord {
    pub id: ResourceId,
    pub ip: String,
    pub pool: String,
    pub fixed_ip: Option<String>,
    pub instance_id: Option<String>,
    /// Index into the pool, 1-based.
    #[serde(skip)]
    slot: usize,
}

#[derive(Debug, Default)]
struct NovaState {
    next_id: u64,
    groups: Vec<SecurityGroupRecord>,
    floating_ips: Vec<FloatingIpRecord>,
}

/// Simulated compute service.
#[derive(Debug)]
pub struct Nova {
    state: Mutex<NovaState>,
    control: ControlPoints,
    id_mode: IdMode,
    tenant_id: String,
    pool: String,
    pool_size: usize,
    quota: Option<usize>,
}

impl Nova {
    pub fn new(config: &ServiceConfig) -> Self {
        let nova = Self {
            state: Mutex::new(NovaState::default()),
            control: ControlPoints::new(),
            id_mode: config.id_mode,
            tenant_id: "tenant".to_string(),
            pool: config.floating_ip_pool.clone(),
            pool_size: config.floating_ip_pool_size.min(MAX_POOL_SIZE),
            quota: config.floating_ip_quota,
        };
        nova.seed_default_group();

        tracing::debug!(
            id_mode = ?nova.id_mode,
            pool = %nova.pool,
            pool_size = nova.pool_size,
            "Simulated nova service created"
        );
        nova
    }

    /// Default settings with the given identifier scheme.
    pub fn with_id_mode(id_mode: IdMode) -> Self {
        Self::new(&ServiceConfig {
            id_mode,
            ..ServiceConfig::default()
        })
    }

    pub fn id_mode(&self) -> IdMode {
        self.id_mode
    }

    fn seed_default_group(&self) {
        let mut state = self.lock();
        let id = self.next_id(&mut state);
        state.groups.push(SecurityGroupRecord {
            id,
            name: DEFAULT_GROUP.to_string(),
            description: "default".to_string(),
            tenant_id: self.tenant_id.clone(),
            rules: Vec::new(),
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NovaState> {
        self.state.lock().expect("nova state mutex poisoned")
    }

    fn next_id(&self, state: &mut NovaState) -> ResourceId {
        state.next_id += 1;
        match self.id_mode {
            IdMode::Numeric => ResourceId::Numeric(state.next_id),
            IdMode::String => ResourceId::Text(uuid::Uuid::new_v4().to_string()),
        }
    }

    // --- Security groups ---

    pub fn add_security_group(
        &self,
        name: &str,
        description: &str,
    ) -> Result<SecurityGroupRecord, ClassifiedError> {
        self.process_control_hook(ADD_SECURITY_GROUP, &[name.to_string(), description.to_string()])?;

        let mut state = self.lock();
        if state.groups.iter().any(|g| g.name == name) {
            return Err(ClassifiedError::fault(format!(
                "A security group with name {} already exists",
                name
            )));
        }
        let id = self.next_id(&mut state);
        let group = SecurityGroupRecord {
            id,
            name: name.to_string(),
            description: description.to_string(),
            tenant_id: self.tenant_id.clone(),
            rules: Vec::new(),
        };
        state.groups.push(group.clone());
        Ok(group)
    }

    pub fn security_group(&self, id: &str) -> Result<SecurityGroupRecord, ClassifiedError> {
        self.process_control_hook(SECURITY_GROUP, &[id.to_string()])?;

        self.lock()
            .groups
            .iter()
            .find(|g| g.id.to_string() == id)
            .cloned()
            .ok_or_else(|| ClassifiedError::not_found(ResourceKind::SecurityGroup, id))
    }

    pub fn all_security_groups(&self) -> Result<Vec<SecurityGroupRecord>, ClassifiedError> {
        self.process_control_hook(ALL_SECURITY_GROUPS, &[])?;
        Ok(self.lock().groups.clone())
    }

    pub fn remove_security_group(&self, id: &str) -> Result<(), ClassifiedError> {
        self.process_control_hook(REMOVE_SECURITY_GROUP, &[id.to_string()])?;

        let mut state = self.lock();
        let index = state
            .groups
            .iter()
            .position(|g| g.id.to_string() == id)
            .ok_or_else(|| ClassifiedError::not_found(ResourceKind::SecurityGroup, id))?;
        if state.groups[index].name == DEFAULT_GROUP {
            return Err(ClassifiedError::fault(format!(
                "Unable to delete system group '{}'",
                DEFAULT_GROUP
            )));
        }
        state.groups.remove(index);
        Ok(())
    }

    // --- Floating ips ---

    pub fn add_floating_ip(&self) -> Result<FloatingIpRecord, ClassifiedError> {
        self.process_control_hook(ADD_FLOATING_IP, &[])?;

        let mut state = self.lock();
        if let Some(quota) = self.quota {
            if state.floating_ips.len() >= quota {
                return Err(ClassifiedError::quota_exceeded(ResourceKind::FloatingIp));
            }
        }
        let slot = (1..=self.pool_size)
            .find(|slot| state.floating_ips.iter().all(|ip| ip.slot != *slot))
            .ok_or_else(|| ClassifiedError::exhausted(ResourceKind::FloatingIp))?;

        let id = self.next_id(&mut state);
        let ip = FloatingIpRecord {
            id,
            ip: slot_address(slot),
            pool: self.pool.clone(),
            fixed_ip: None,
            instance_id: None,
            slot,
        };
        state.floating_ips.push(ip.clone());
        Ok(ip)
    }

    pub fn floating_ip(&self, id: &str) -> Result<FloatingIpRecord, ClassifiedError> {
        self.process_control_hook(FLOATING_IP, &[id.to_string()])?;

        self.lock()
            .floating_ips
            .iter()
            .find(|ip| ip.id.to_string() == id)
            .cloned()
            .ok_or_else(|| ClassifiedError::not_found(ResourceKind::FloatingIp, id))
    }

    pub fn all_floating_ips(&self) -> Result<Vec<FloatingIpRecord>, ClassifiedError> {
        self.process_control_hook(ALL_FLOATING_IPS, &[])?;
        Ok(self.lock().floating_ips.clone())
    }

    pub fn remove_floating_ip(&self, id: &str) -> Result<(), ClassifiedError> {
        self.process_control_hook(REMOVE_FLOATING_IP, &[id.to_string()])?;

        let mut state = self.lock();
        let before = state.floating_ips.len();
        state.floating_ips.retain(|ip| ip.id.to_string() != id);
        if state.floating_ips.len() == before {
            return Err(ClassifiedError::not_found(ResourceKind::FloatingIp, id));
        }
        Ok(())
    }
}

impl Default for Nova {
    fn default() -> Self {
        Self::new(&ServiceConfig::default())
    }
}

impl ServiceControl for Nova {
    fn control_points(&self) -> &ControlPoints {
        &self.control
    }
}

/// Address for a pool slot: 10.0.0.1, 10.0.0.2, ... 10.0.1.0, ...
fn slot_address(slot: usize) -> String {
    format!(
        "10.{}.{}.{}",
        (slot >> 16) & 0xff,
        (slot >> 8) & 0xff,
        slot & 0xff
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testservices::control::{always, fail_times};

    #[test]
    fn test_numeric_ids_are_sequential() {
        let nova = Nova::with_id_mode(IdMode::Numeric);
        let a = nova.add_security_group("a", "").unwrap();
        let b = nova.add_security_group("b", "").unwrap();
        assert_eq!(a.id, ResourceId::Numeric(2));
        assert_eq!(b.id, ResourceId::Numeric(3));
        assert_eq!(serde_json::to_value(&a).unwrap()["id"], serde_json::json!(2));
    }

    #[test]
    fn test_string_ids() {
        let nova = Nova::with_id_mode(IdMode::String);
        let a = nova.add_security_group("a", "").unwrap();
        assert!(matches!(a.id, ResourceId::Text(_)));
        assert!(serde_json::to_value(&a).unwrap()["id"].is_string());
        assert_eq!(nova.security_group(&a.id.to_string()).unwrap().name, "a");
    }

    #[test]
    fn test_default_group_seeded_and_protected() {
        let nova = Nova::default();
        let groups = nova.all_security_groups().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, DEFAULT_GROUP);

        let err = nova.remove_security_group(&groups[0].id.to_string()).unwrap_err();
        assert!(err.is_fault());
    }

    #[test]
    fn test_duplicate_group_name() {
        let nova = Nova::default();
        nova.add_security_group("web", "").unwrap();
        let err = nova.add_security_group("web", "").unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_remove_missing_group() {
        let nova = Nova::default();
        let err = nova.remove_security_group("999").unwrap_err();
        assert_eq!(err, ClassifiedError::not_found(ResourceKind::SecurityGroup, "999"));
    }

    #[test]
    fn test_pool_exhaustion_and_reuse() {
        let nova = Nova::new(&ServiceConfig {
            floating_ip_pool_size: 2,
            ..ServiceConfig::default()
        });
        let first = nova.add_floating_ip().unwrap();
        let second = nova.add_floating_ip().unwrap();
        assert_eq!(first.ip, "10.0.0.1");
        assert_eq!(second.ip, "10.0.0.2");

        let err = nova.add_floating_ip().unwrap_err();
        assert_eq!(err.to_string(), "Zero floating ips available");

        nova.remove_floating_ip(&first.id.to_string()).unwrap();
        assert_eq!(nova.add_floating_ip().unwrap().ip, "10.0.0.1");
    }

    #[test]
    fn test_quota() {
        let nova = Nova::new(&ServiceConfig {
            floating_ip_quota: Some(1),
            ..ServiceConfig::default()
        });
        nova.add_floating_ip().unwrap();
        let err = nova.add_floating_ip().unwrap_err();
        assert_eq!(err.to_string(), "Maximum number of floating ips exceeded");
    }

    #[test]
    fn test_control_point_blocks_operation() {
        let nova = Nova::default();
        let group = nova.add_security_group("g", "").unwrap();
        let id = group.id.to_string();

        nova.register_control_point(
            REMOVE_SECURITY_GROUP,
            Some(fail_times(1, ClassifiedError::rate_limited(None))),
        );
        assert!(nova.remove_security_group(&id).unwrap_err().is_rate_limited());
        // Rejected call left the group in place.
        assert!(nova.security_group(&id).is_ok());
        assert!(nova.remove_security_group(&id).is_ok());
        nova.register_control_point(REMOVE_SECURITY_GROUP, None);
    }

    #[test]
    fn test_listing_hook() {
        let nova = Nova::default();
        nova.register_control_point(ALL_FLOATING_IPS, Some(always(ClassifiedError::fault("down"))));
        assert!(nova.all_floating_ips().is_err());
        nova.register_control_point(ALL_FLOATING_IPS, None);
        assert!(nova.all_floating_ips().unwrap().is_empty());
    }

    #[test]
    fn test_slot_address() {
        assert_eq!(slot_address(1), "10.0.0.1");
        assert_eq!(slot_address(256), "10.0.1.0");
    }

    #[test]
    fn test_slot_addresses_are_distinct_past_second_octet() {
        assert_eq!(slot_address(1), "10.0.0.1");
        assert_eq!(slot_address(0x1_0000), "10.1.0.0");
        assert_ne!(slot_address(1), slot_address(0x1_0001));
        assert_eq!(slot_address(MAX_POOL_SIZE), "10.255.255.255");
    }

    #[test]
    fn test_oversized_pool_is_clamped() {
        let nova = Nova::new(&ServiceConfig {
            floating_ip_pool_size: usize::MAX,
            ..ServiceConfig::default()
        });
        assert_eq!(nova.pool_size, MAX_POOL_SIZE);
    }
}
