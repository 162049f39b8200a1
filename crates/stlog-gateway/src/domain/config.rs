//! Gateway configuration with validation.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Network and timing configuration for one gateway process.
///
/// Log identity (signer, witnesses, policy) is wired programmatically via
/// [`crate::LogParameters`]; this struct only carries what differs between
/// deployments of the same log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Bind address.
    pub host: IpAddr,
    /// Bind port.
    pub port: u16,
    /// Deadline applied to every backend call.
    #[serde(with = "humantime_serde")]
    pub deadline: Duration,
    /// Period of the cosigned tree head rotation.
    #[serde(with = "humantime_serde")]
    pub rotation_interval: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
            deadline: Duration::from_secs(10),
            rotation_interval: Duration::from_secs(10),
        }
    }
}

impl GatewayConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deadline.is_zero() {
            return Err(ConfigError::InvalidTimeout("deadline cannot be 0".into()));
        }
        if self.rotation_interval.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "rotation_interval cannot be 0".into(),
            ));
        }
        Ok(())
    }

    /// The socket address to bind.
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Configuration validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        GatewayConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_durations_are_rejected() {
        let mut config = GatewayConfig::default();
        config.deadline = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.rotation_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn durations_deserialize_from_humantime() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"deadline": "2s", "rotation_interval": "30s"}"#).unwrap();
        assert_eq!(config.deadline, Duration::from_secs(2));
        assert_eq!(config.rotation_interval, Duration::from_secs(30));
    }
}
