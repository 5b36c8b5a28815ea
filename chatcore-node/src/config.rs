//! Process-environment configuration.
//!
//! Parsed once at startup into a validated [`NodeConfig`]; a missing
//! required variable, a malformed port, or an empty region list are all
//! startup errors surfaced through [`ConfigError`], never a panic.

use std::time::Duration;

use chatcore_rt::Region;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(String),
    #[error("invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
    #[error("REGIONS must name at least one region")]
    EmptyRegionList,
}

fn env_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

fn env_var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Connection details for the Postgres store of record, built either from
/// a single `PSQL_DB_URL` or composed from the discrete `PSQL_DB_*` parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub url: String,
}

impl PostgresConfig {
    fn from_env() -> Result<Self, ConfigError> {
        if let Ok(url) = std::env::var("PSQL_DB_URL") {
            return Ok(Self { url });
        }
        let host = env_var_or("PSQL_DB_HOST", "localhost");
        let port = env_var_or("PSQL_DB_PORT", "5432");
        let user = env_var("PSQL_DB_USER")?;
        let password = env_var("PSQL_DB_PASSWORD")?;
        let name = env_var("PSQL_DB_NAME")?;
        Ok(Self {
            url: format!("postgres://{user}:{password}@{host}:{port}/{name}"),
        })
    }
}

/// Connection details for the Dragonfly/Redis-protocol presence cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragonflyConfig {
    pub url: String,
}

impl DragonflyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        if let Ok(url) = std::env::var("DRAGONFLY_DB_URL") {
            return Ok(Self { url });
        }
        let host = env_var_or("DRAGONFLY_DB_HOST", "localhost");
        let port = env_var_or("DRAGONFLY_DB_PORT", "6379");
        let password = std::env::var("DRAGONFLY_DB_PASSWORD").ok();
        let url = match password {
            Some(password) => format!("redis://:{password}@{host}:{port}"),
            None => format!("redis://{host}:{port}"),
        };
        Ok(Self { url })
    }
}

/// Blob storage credentials. Out of this core's scope —
/// carried only so the process can validate its full environment contract
/// at startup; never read past this struct.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AwsConfig {
    pub region: Option<String>,
    pub bucket: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl AwsConfig {
    fn from_env() -> Self {
        Self {
            region: std::env::var("AWS_REGION").ok(),
            bucket: std::env::var("AWS_BUCKET").ok(),
            access_key_id: std::env::var("AWS_ACCESS_KEY_ID").ok(),
            secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
        }
    }
}

/// This process's full validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub node_id: String,
    pub region: Region,
    pub node_ip: String,
    pub port: u16,
    pub domain: Option<String>,
    pub cdn_url: Option<String>,
    pub regions: Vec<Region>,
    pub log_level: String,
    pub postgres: PostgresConfig,
    pub dragonfly: DragonflyConfig,
    pub aws: AwsConfig,
}

impl NodeConfig {
    /// Parse and validate the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let node_id = env_var("NODE_ID")?;
        let region = Region::new(env_var("REGION")?);
        let node_ip = env_var_or("NODE_IP", "0.0.0.0");
        let port_raw = env_var_or("PORT", "8080");
        let port: u16 = port_raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT".to_string(), port_raw))?;

        let regions = match std::env::var("REGIONS") {
            Ok(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(Region::new)
                .collect(),
            Err(_) => vec![Region::new("na"), Region::new("eu"), Region::new("asia")],
        };
        if regions.is_empty() {
            return Err(ConfigError::EmptyRegionList);
        }

        Ok(Self {
            node_id,
            region,
            node_ip,
            port,
            domain: std::env::var("DOMAIN").ok(),
            cdn_url: std::env::var("CDN_URL").ok(),
            regions,
            log_level: env_var_or("LOG_LEVEL", "info"),
            postgres: PostgresConfig::from_env()?,
            dragonfly: DragonflyConfig::from_env()?,
            aws: AwsConfig::from_env(),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.node_ip, self.port)
    }

    /// The deadline used for every hub-level `request` fan-out
    /// (`GetServerUsers`, `GetActiveUsers`, `GetActiveFriends`).
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize the tests that
    // touch them so they don't race each other under `cargo test`'s
    // parallel runner.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_all() {
        for var in [
            "NODE_ID", "REGION", "NODE_IP", "PORT", "DOMAIN", "CDN_URL", "REGIONS", "LOG_LEVEL",
            "PSQL_DB_URL", "PSQL_DB_HOST", "PSQL_DB_PORT", "PSQL_DB_USER", "PSQL_DB_PASSWORD", "PSQL_DB_NAME",
            "DRAGONFLY_DB_URL", "DRAGONFLY_DB_HOST", "DRAGONFLY_DB_PORT", "DRAGONFLY_DB_PASSWORD",
            "AWS_REGION", "AWS_BUCKET", "AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn missing_node_id_is_a_config_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        let err = NodeConfig::from_env().unwrap_err();
        assert_eq!(err, ConfigError::MissingVar("NODE_ID".to_string()));
    }

    #[test]
    fn full_env_parses_with_defaults_for_optional_vars() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var("NODE_ID", "node-1");
        std::env::set_var("REGION", "na");
        std::env::set_var("PSQL_DB_USER", "chatcore");
        std::env::set_var("PSQL_DB_PASSWORD", "secret");
        std::env::set_var("PSQL_DB_NAME", "chatcore");

        let config = NodeConfig::from_env().unwrap();
        assert_eq!(config.node_id, "node-1");
        assert_eq!(config.region, Region::new("na"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.regions, vec![Region::new("na"), Region::new("eu"), Region::new("asia")]);
        assert_eq!(config.log_level, "info");
        assert!(config.postgres.url.contains("chatcore:secret@"));
        clear_all();
    }

    #[test]
    fn regions_env_var_overrides_default_list() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var("NODE_ID", "node-1");
        std::env::set_var("REGION", "na");
        std::env::set_var("PSQL_DB_USER", "chatcore");
        std::env::set_var("PSQL_DB_PASSWORD", "secret");
        std::env::set_var("PSQL_DB_NAME", "chatcore");
        std::env::set_var("REGIONS", "na, eu");

        let config = NodeConfig::from_env().unwrap();
        assert_eq!(config.regions, vec![Region::new("na"), Region::new("eu")]);
        clear_all();
    }

    #[test]
    fn invalid_port_is_a_config_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        std::env::set_var("NODE_ID", "node-1");
        std::env::set_var("REGION", "na");
        std::env::set_var("PSQL_DB_USER", "chatcore");
        std::env::set_var("PSQL_DB_PASSWORD", "secret");
        std::env::set_var("PSQL_DB_NAME", "chatcore");
        std::env::set_var("PORT", "not-a-port");

        let err = NodeConfig::from_env().unwrap_err();
        assert_eq!(err, ConfigError::InvalidValue("PORT".to_string(), "not-a-port".to_string()));
        clear_all();
    }
}
