//! Config types: process settings read from the environment and resource definitions read from JSON.

use crate::error::ConfigError;
use crate::model::ModelConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identity reported by the welcome and version endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub source: String,
    pub domain: String,
}

impl Default for AppInfo {
    fn default() -> Self {
        AppInfo {
            name: env!("CARGO_PKG_NAME").into(),
            version: env!("CARGO_PKG_VERSION").into(),
            description: env!("CARGO_PKG_DESCRIPTION").into(),
            source: String::new(),
            domain: "localhost".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    /// Maximum request body size in bytes.
    pub body_limit: usize,
}

impl HttpConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            host: "0.0.0.0".into(),
            port: 3000,
            body_limit: 2 * 1024 * 1024,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DatabaseConfig {
    /// Unset means every resource is served from memory.
    pub url: Option<String>,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// The configured URL, or an error naming `command` when none is set.
    pub fn require_url(&self, command: &str) -> Result<&str, ConfigError> {
        self.url
            .as_deref()
            .ok_or_else(|| ConfigError::Load(format!("DATABASE_URL is required for {}", command)))
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            url: None,
            max_connections: 5,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub app: AppInfo,
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub resources_path: PathBuf,
    pub boot_logs: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            app: AppInfo::default(),
            http: HttpConfig::default(),
            database: DatabaseConfig::default(),
            resources_path: PathBuf::from("config/resources.json"),
            boot_logs: true,
        }
    }
}

/// One REST resource: the URL segment it is served under and its model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub path_segment: String,
    #[serde(flatten)]
    pub model: ModelConfig,
}

impl ResourceConfig {
    pub fn new(path_segment: impl Into<String>, model: ModelConfig) -> Self {
        ResourceConfig {
            path_segment: path_segment.into(),
            model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_url() {
        let config = DatabaseConfig::default();
        let err = config.require_url("db:seed").unwrap_err();
        assert_eq!(err.to_string(), "config load: DATABASE_URL is required for db:seed");

        let config = DatabaseConfig {
            url: Some("postgres://localhost/shop".into()),
            ..DatabaseConfig::default()
        };
        assert_eq!(config.require_url("db:wipe").unwrap(), "postgres://localhost/shop");
    }
}
