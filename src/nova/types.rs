//! Compute API resource types.
//!
//! Providers disagree on identifier encoding: some send JSON numbers, others
//! strings. Both are read into `String` so callers never see the difference.

use serde::{Deserialize, Deserializer, Serialize};

/// A named set of network access rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroup {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tenant_id: String,
}

/// A public address allocated to the tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloatingIp {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub ip: String,
    #[serde(default)]
    pub pool: String,
    #[serde(default)]
    pub fixed_ip: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub instance_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SecurityGroupsEnvelope {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub security_groups: Vec<SecurityGroup>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SecurityGroupEnvelope {
    pub security_group: SecurityGroup,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FloatingIpsEnvelope {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub floating_ips: Vec<FloatingIp>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FloatingIpEnvelope {
    pub floating_ip: FloatingIp,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
