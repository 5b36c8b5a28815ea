// Layer 1: Standard library
use std::time::Duration;

// Layer 2: Third-party
use serde::{Deserialize, Serialize};

// Layer 3: Internal
use crate::mailbox::BackpressureStrategy;

pub const DEFAULT_MAILBOX_CAPACITY: usize = 1000;
pub const DEFAULT_SPAWN_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-`ActorSystem` configuration (one system exists per actor kind).
///
/// # Example
/// ```rust
/// use chatcore_rt::system::SystemConfig;
/// use std::time::Duration;
///
/// let config = SystemConfig::builder()
///     .with_mailbox_capacity(500)
///     .with_request_timeout(Duration::from_secs(5))
///     .build()
///     .unwrap();
/// assert_eq!(config.mailbox_capacity, 500);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    pub mailbox_capacity: usize,
    #[serde(with = "duration_seconds")]
    pub spawn_timeout: Duration,
    #[serde(with = "duration_seconds")]
    pub shutdown_timeout: Duration,
    #[serde(with = "duration_seconds")]
    pub request_timeout: Duration,
    #[serde(skip, default = "default_backpressure")]
    pub backpressure: BackpressureStrategy,
}

fn default_backpressure() -> BackpressureStrategy {
    BackpressureStrategy::Block
}

mod duration_seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            spawn_timeout: DEFAULT_SPAWN_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            backpressure: BackpressureStrategy::Block,
        }
    }
}

impl SystemConfig {
    pub fn builder() -> SystemConfigBuilder {
        SystemConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.mailbox_capacity == 0 {
            return Err("mailbox_capacity must be > 0".to_string());
        }
        if self.spawn_timeout.is_zero() {
            return Err("spawn_timeout must be > 0".to_string());
        }
        if self.shutdown_timeout.is_zero() {
            return Err("shutdown_timeout must be > 0".to_string());
        }
        if self.request_timeout.is_zero() {
            return Err("request_timeout must be > 0".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct SystemConfigBuilder {
    config: SystemConfig,
}

impl SystemConfigBuilder {
    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.config.mailbox_capacity = capacity;
        self
    }

    pub fn with_spawn_timeout(mut self, timeout: Duration) -> Self {
        self.config.spawn_timeout = timeout;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn with_backpressure(mut self, strategy: BackpressureStrategy) -> Self {
        self.config.backpressure = strategy;
        self
    }

    pub fn build(self) -> Result<SystemConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SystemConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mailbox_capacity, 1000);
    }

    #[test]
    fn zero_mailbox_capacity_fails_validation() {
        let result = SystemConfig::builder().with_mailbox_capacity(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = SystemConfig::builder()
            .with_mailbox_capacity(250)
            .with_request_timeout(Duration::from_secs(3))
            .build()
            .unwrap();
        assert_eq!(config.mailbox_capacity, 250);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }
}
