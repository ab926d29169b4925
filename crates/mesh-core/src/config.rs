//! Membership configuration and validation.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required option: {0}")]
    Missing(&'static str),
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Configuration for a membership engine.
///
/// Durations are given in seconds when loaded from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipConfig {
    /// Display name
    pub name: String,

    /// This node's reachable address (registry key and self-exclusion filter)
    #[serde(alias = "addr")]
    pub address: String,

    /// Shared secret, identical on every node in the group
    #[serde(alias = "key")]
    pub secret: String,

    /// Seed peer, contacted only while the registry is empty
    #[serde(default, alias = "lookup")]
    pub bootstrap_address: Option<String>,

    /// Contact known peers every round (otherwise rely on inbound registrations)
    #[serde(default = "default_true", alias = "scan")]
    pub active_scan: bool,

    /// Scheduler period (default: 10s)
    #[serde(default = "default_scan_interval", with = "secs")]
    pub scan_interval: Duration,

    /// Run the liveness sweeper
    #[serde(default = "default_true")]
    pub sweep_enabled: bool,

    /// Sweeper period (default: 10s)
    #[serde(default = "default_sweep_interval", with = "secs")]
    pub sweep_interval: Duration,

    /// Peers not refreshed for this long are evicted (default: 5 minutes)
    #[serde(default = "default_stale_after", with = "secs")]
    pub stale_after: Duration,

    /// Upper bound on one exchange (default: 5s)
    #[serde(default = "default_exchange_timeout", with = "secs")]
    pub exchange_timeout: Duration,
}

fn default_true() -> bool {
    true
}

fn default_scan_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_stale_after() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_exchange_timeout() -> Duration {
    Duration::from_secs(5)
}

impl MembershipConfig {
    /// Config with required fields set and everything else defaulted.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            secret: secret.into(),
            bootstrap_address: None,
            active_scan: true,
            scan_interval: default_scan_interval(),
            sweep_enabled: true,
            sweep_interval: default_sweep_interval(),
            stale_after: default_stale_after(),
            exchange_timeout: default_exchange_timeout(),
        }
    }

    pub fn with_bootstrap(mut self, address: impl Into<String>) -> Self {
        self.bootstrap_address = Some(address.into());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Missing("name"));
        }
        if self.address.trim().is_empty() {
            return Err(ConfigError::Missing("address"));
        }
        if self.secret.is_empty() {
            return Err(ConfigError::Missing("secret"));
        }
        for (label, value) in [
            ("scan_interval", self.scan_interval),
            ("sweep_interval", self.sweep_interval),
            ("stale_after", self.stale_after),
            ("exchange_timeout", self.exchange_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration(label));
            }
        }
        Ok(())
    }
}

/// Durations as whole seconds.
mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MembershipConfig::new("alpha", "a:1000", "s");
        assert!(config.active_scan);
        assert!(config.sweep_enabled);
        assert_eq!(config.stale_after, Duration::from_secs(300));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            MembershipConfig::new("", "a:1000", "s").validate(),
            Err(ConfigError::Missing("name"))
        );
        assert_eq!(
            MembershipConfig::new("alpha", " ", "s").validate(),
            Err(ConfigError::Missing("address"))
        );
        assert_eq!(
            MembershipConfig::new("alpha", "a:1000", "").validate(),
            Err(ConfigError::Missing("secret"))
        );
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = MembershipConfig::new("alpha", "a:1000", "s");
        config.exchange_timeout = Duration::ZERO;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroDuration("exchange_timeout"))
        );
    }

    #[test]
    fn test_parse_with_aliases() {
        let json = r#"{
            "name": "alpha",
            "addr": "http://a:1000",
            "key": "s",
            "lookup": "http://b:2000",
            "scan": false,
            "stale_after": 60
        }"#;
        let config: MembershipConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.address, "http://a:1000");
        assert_eq!(config.secret, "s");
        assert_eq!(config.bootstrap_address.as_deref(), Some("http://b:2000"));
        assert!(!config.active_scan);
        assert_eq!(config.stale_after, Duration::from_secs(60));
        assert_eq!(config.scan_interval, Duration::from_secs(10));
    }
}
