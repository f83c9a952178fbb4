//! Application configuration.
//!
//! Loaded from an optional YAML file; every field has a default so an empty
//! or partial file is valid. Command-line flags override file values.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use crate::mock::{EngineOptions, DEFAULT_LOG_CAPACITY};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub mock: MockConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub request_log: RequestLogConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AdminConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_admin_port")]
    pub port: u16,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_admin_port(),
        }
    }
}

/// Listener options for the mock server. The port itself is a persisted
/// setting, not configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MockConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    /// Start the mock listener when the process starts.
    #[serde(default)]
    pub autostart: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            autostart: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RequestLogConfig {
    #[serde(default = "default_log_capacity")]
    pub capacity: usize,
}

impl Default for RequestLogConfig {
    fn default() -> Self {
        Self {
            capacity: default_log_capacity(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_admin_port() -> u16 {
    2525
}

fn default_store_path() -> PathBuf {
    PathBuf::from("resonance-store.json")
}

fn default_log_capacity() -> usize {
    DEFAULT_LOG_CAPACITY
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.admin.port == 0 {
            anyhow::bail!("admin.port must be non-zero");
        }
        if self.store.path.as_os_str().is_empty() {
            anyhow::bail!("store.path must not be empty");
        }
        Ok(())
    }

    pub fn admin_addr(&self) -> SocketAddr {
        SocketAddr::new(self.admin.host, self.admin.port)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            host: self.mock.host.to_string(),
            log_capacity: self.request_log.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.admin_addr().to_string(), "127.0.0.1:2525");
        assert_eq!(config.store.path, PathBuf::from("resonance-store.json"));
        assert_eq!(config.request_log.capacity, 100);
        assert!(!config.mock.autostart);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
admin:
  port: 9090
mock:
  host: 0.0.0.0
  autostart: true
requestLog:
  capacity: 10
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.admin.port, 9090);
        assert_eq!(config.admin.host, default_host());
        assert!(config.mock.autostart);
        assert_eq!(config.engine_options().host, "0.0.0.0");
        assert_eq!(config.engine_options().log_capacity, 10);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "store:\n  path: /tmp/custom-store.json").unwrap();
        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.store.path, PathBuf::from("/tmp/custom-store.json"));
    }

    #[test]
    fn test_from_file_rejects_zero_admin_port() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "admin:\n  port: 0").unwrap();
        assert!(AppConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(AppConfig::from_file("/definitely/not/here.yaml").is_err());
    }
}
