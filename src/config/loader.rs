//! Load settings from the environment and resource definitions from a JSON file.

use crate::config::{validate, AppConfig, ResourceConfig};
use crate::error::ConfigError;
use crate::model::{ColumnSpec, FieldList, ModelConfig};
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Read settings from process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("APP_NAME") {
            config.app.name = v;
        }
        if let Some(v) = get("APP_VERSION") {
            config.app.version = v;
        }
        if let Some(v) = get("APP_DESCRIPTION") {
            config.app.description = v;
        }
        if let Some(v) = get("APP_SOURCE") {
            config.app.source = v;
        }
        if let Some(v) = get("APP_DOMAIN") {
            config.app.domain = v;
        }
        if let Some(v) = get("HOST") {
            config.http.host = v;
        }
        if let Some(v) = get("PORT") {
            config.http.port = parse("PORT", &v)?;
        }
        if let Some(v) = get("BODY_LIMIT") {
            config.http.body_limit = parse("BODY_LIMIT", &v)?;
        }
        config.database.url = get("DATABASE_URL");
        if let Some(v) = get("DB_MAX_CONNECTIONS") {
            config.database.max_connections = parse("DB_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = get("RESOURCES_PATH") {
            config.resources_path = PathBuf::from(v);
        }
        if let Some(v) = get("BOOT_LOGS") {
            config.boot_logs = parse_bool("BOOT_LOGS", &v)?;
        }
        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Load(format!("{}: invalid value '{}'", key, value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Load(format!("{}: invalid value '{}'", key, value))),
    }
}

/// Parse and validate resource definitions from a JSON array.
pub fn parse_resources(json: &str) -> Result<Vec<ResourceConfig>, ConfigError> {
    let resources: Vec<ResourceConfig> =
        serde_json::from_str(json).map_err(|e| ConfigError::Load(format!("resources: {}", e)))?;
    validate(&resources)?;
    Ok(resources)
}

/// Load resource definitions from `path`, or the built-in set when the file does not exist.
pub fn load_resources(path: &Path) -> Result<Vec<ResourceConfig>, ConfigError> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "resources file not found, using built-in resources");
        return Ok(default_resources());
    }
    let json = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    parse_resources(&json)
}

/// The `products` resource served when no resources file is configured.
pub fn default_resources() -> Vec<ResourceConfig> {
    let products = ModelConfig::new("products")
        .soft_delete(true)
        .timestamps(true)
        .attributes(FieldList::only(["id", "title", "description"]))
        .persist_only(FieldList::only(["title", "description"]))
        .column(ColumnSpec::new("title", "text").not_null())
        .column(ColumnSpec::new("description", "text"));
    vec![ResourceConfig::new("products", products)]
}
