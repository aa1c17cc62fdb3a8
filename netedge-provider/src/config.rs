//! Provider configuration
//!
//! Deadlines and poll intervals for the provisioning waits. Values are given
//! in seconds, either as JSON or as attributes of a provider block.

use std::collections::HashMap;
use std::time::Duration;

use netedge_core::provider::{ProviderError, ProviderResult};
use netedge_core::resource::Value;
use serde::{Deserialize, Deserializer};

fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_secs)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// Deadline for each wait during creation
    #[serde(deserialize_with = "seconds")]
    pub create_timeout: Duration,
    /// Deadline for each wait during an update
    #[serde(deserialize_with = "seconds")]
    pub update_timeout: Duration,
    /// Interval between provisioning and license status polls
    #[serde(deserialize_with = "seconds")]
    pub poll_interval: Duration,
    /// Interval between ACL template status polls
    #[serde(deserialize_with = "seconds")]
    pub acl_poll_interval: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            create_timeout: Duration::from_secs(60 * 60),
            update_timeout: Duration::from_secs(10 * 60),
            poll_interval: Duration::from_secs(5),
            acl_poll_interval: Duration::from_secs(1),
        }
    }
}

impl ProviderConfig {
    pub const CREATE_TIMEOUT: &'static str = "create_timeout";
    pub const UPDATE_TIMEOUT: &'static str = "update_timeout";
    pub const POLL_INTERVAL: &'static str = "poll_interval";
    pub const ACL_POLL_INTERVAL: &'static str = "acl_poll_interval";

    /// Parse a JSON document; missing keys keep their defaults
    pub fn from_json(json: &str) -> ProviderResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            ProviderError::configuration("invalid provider configuration").with_cause(e)
        })
    }

    /// Build from the attributes of a provider block
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> ProviderResult<Self> {
        let mut config = Self::default();
        for (key, value) in attributes {
            let slot = match key.as_str() {
                Self::CREATE_TIMEOUT => &mut config.create_timeout,
                Self::UPDATE_TIMEOUT => &mut config.update_timeout,
                Self::POLL_INTERVAL => &mut config.poll_interval,
                Self::ACL_POLL_INTERVAL => &mut config.acl_poll_interval,
                other => {
                    return Err(ProviderError::configuration(format!(
                        "unknown provider attribute: {}",
                        other
                    )));
                }
            };
            *slot = Self::duration(key, value)?;
        }
        Ok(config)
    }

    fn duration(key: &str, value: &Value) -> ProviderResult<Duration> {
        match value {
            Value::Int(secs) if *secs >= 0 => Ok(Duration::from_secs(secs.unsigned_abs())),
            other => Err(ProviderError::configuration(format!(
                "{} must be a non-negative number of seconds, got {:?}",
                key, other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use netedge_core::provider::ErrorKind;

    use super::*;

    #[test]
    fn defaults_match_operation_classes() {
        let config = ProviderConfig::default();
        assert_eq!(config.create_timeout, Duration::from_secs(3600));
        assert_eq!(config.update_timeout, Duration::from_secs(600));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.acl_poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn from_json_overrides_given_keys() {
        let config = ProviderConfig::from_json(r#"{"create_timeout": 120}"#).unwrap();
        assert_eq!(config.create_timeout, Duration::from_secs(120));
        assert_eq!(config.update_timeout, Duration::from_secs(600));
    }

    #[test]
    fn from_json_rejects_unknown_keys() {
        let err = ProviderConfig::from_json(r#"{"retries": 3}"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[test]
    fn from_attributes() {
        let attrs = HashMap::from([
            ("update_timeout".to_string(), Value::Int(30)),
            ("acl_poll_interval".to_string(), Value::Int(2)),
        ]);
        let config = ProviderConfig::from_attributes(&attrs).unwrap();
        assert_eq!(config.update_timeout, Duration::from_secs(30));
        assert_eq!(config.acl_poll_interval, Duration::from_secs(2));
        assert_eq!(config.create_timeout, Duration::from_secs(3600));

        let attrs = HashMap::from([("poll_interval".to_string(), Value::Int(-1))]);
        assert!(ProviderConfig::from_attributes(&attrs).is_err());
    }
}
