//! # Configuration Management for Pulseboard
//!
//! This crate provides centralized configuration structures for all Pulseboard components,
//! including database backend selection, result cache sizing and the HTTP server.
//!
//! ## TOML File Configuration
//! ```toml
//! [database]
//! local_path = "data/tribit.db"
//! environment = "development"
//! busy_timeout_ms = 5000
//! query_timeout_ms = 5000
//! max_connections = 5
//!
//! [cache]
//! max_entries = 500
//! default_ttl_seconds = 300
//! update_age_on_get = true
//! monitor_interval_seconds = 60
//!
//! [server]
//! host = "0.0.0.0"
//! port = 3000
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // Load from PULSEBOARD_CONFIG, ./pulseboard.toml or defaults, then apply env overrides
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```
//!
//! Remote credentials are normally supplied through the environment
//! (`TURSO_DATABASE_URL`, `TURSO_AUTH_TOKEN`, `USE_TURSO`) rather than the file.

use serde::{Deserialize, Serialize};
use std::{env, path::Path, time::Duration};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./pulseboard.toml";
const CONFIG_PATH_VAR: &str = "PULSEBOARD_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Environment variable error: {0}")]
    Env(#[from] env::VarError),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
}

/// Runtime mode, mirrors the hosting platform's production signal
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Environment::Production),
            "development" | "dev" => Some(Environment::Development),
            "test" => Some(Environment::Test),
            _ => None,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Embedded database file used in development (opened read-only)
    pub local_path: String,
    /// Hosted database URL (`libsql://` or `https://`)
    pub remote_url: Option<String>,
    pub auth_token: Option<String>,
    /// Use the remote backend outside production when credentials exist
    pub force_remote: bool,
    pub environment: Environment,
    pub busy_timeout_ms: u64,
    pub query_timeout_ms: u64,
    pub max_connections: u32,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: u64,
    pub default_ttl_seconds: u64,
    /// Refresh an entry's TTL whenever it is read
    pub update_age_on_get: bool,
    /// Interval for the periodic utilization log; 0 disables the monitor
    pub monitor_interval_seconds: u64,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            local_path: "data/tribit.db".to_string(),
            remote_url: None,
            auth_token: None,
            force_remote: false,
            environment: Environment::Development,
            busy_timeout_ms: 5000,
            query_timeout_ms: 5000,
            max_connections: 5,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 500,
            default_ttl_seconds: 300,
            update_age_on_get: true,
            monitor_interval_seconds: 60,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file specified in .env, the default path, or built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e.into()),
        }

        let mut config = if let Ok(config_path) = env::var(CONFIG_PATH_VAR) {
            Self::read_file(&config_path)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::read_file(DEFAULT_CONFIG_PATH)?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply environment overrides through `lookup`, which returns the value of a variable
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("TURSO_DATABASE_URL") {
            self.database.remote_url = Some(url);
        }
        if let Some(token) = non_empty("TURSO_AUTH_TOKEN") {
            self.database.auth_token = Some(token);
        }
        if let Some(flag) = non_empty("USE_TURSO") {
            self.database.force_remote = parse_bool("USE_TURSO", &flag)?;
        }
        if let Some(path) = non_empty("DATABASE_PATH") {
            self.database.local_path = path;
        }

        let mode = non_empty("APP_ENV").or_else(|| non_empty("NODE_ENV"));
        if let Some(mode) = mode {
            self.database.environment = Environment::parse(&mode).ok_or_else(|| {
                ConfigError::Invalid(format!("Unknown environment '{}'", mode))
            })?;
        }
        // The hosting platform marks deployments with VERCEL
        if non_empty("VERCEL").is_some() {
            self.database.environment = Environment::Production;
        }

        if let Some(host) = non_empty("PULSEBOARD_HOST") {
            self.server.host = host;
        }
        if let Some(port) = non_empty("PULSEBOARD_PORT") {
            self.server.port = port.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("PULSEBOARD_PORT must be a port number, got '{}'", port))
            })?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Database validations
        if self.database.local_path.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "Database local_path cannot be empty".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "Database max_connections must be greater than 0".to_string(),
            ));
        }
        if self.database.query_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "Database query_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if let Some(url) = &self.database.remote_url {
            let known_scheme = ["libsql://", "https://", "http://"]
                .iter()
                .any(|scheme| url.starts_with(scheme));
            if !known_scheme {
                return Err(ConfigError::Invalid(format!(
                    "Remote database URL must use libsql://, https:// or http://, got '{}'",
                    url
                )));
            }
        }

        // Cache validations
        if self.cache.max_entries == 0 {
            return Err(ConfigError::Invalid(
                "Cache max_entries must be greater than 0".to_string(),
            ));
        }
        if self.cache.default_ttl_seconds == 0 {
            return Err(ConfigError::Invalid(
                "Cache default_ttl_seconds must be greater than 0".to_string(),
            ));
        }

        // Server validations
        if self.server.host.is_empty() {
            return Err(ConfigError::Invalid("Server host cannot be empty".to_string()));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    /// Remote URL and token, only when both are present
    pub fn remote_credentials(&self) -> Option<(&str, &str)> {
        match (&self.remote_url, &self.auth_token) {
            (Some(url), Some(token)) => Some((url.as_str(), token.as_str())),
            _ => None,
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl CacheConfig {
    /// Create a new cache configuration
    pub fn new(max_entries: u64, default_ttl_seconds: u64, update_age_on_get: bool) -> Self {
        Self {
            max_entries,
            default_ttl_seconds,
            update_age_on_get,
            ..Self::default()
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }

    /// Monitor interval, `None` when disabled
    pub fn monitor_interval(&self) -> Option<Duration> {
        (self.monitor_interval_seconds > 0)
            .then(|| Duration::from_secs(self.monitor_interval_seconds))
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.database.local_path, "data/tribit.db");
        assert_eq!(config.cache.max_entries, 500);
        assert_eq!(config.cache.default_ttl(), Duration::from_secs(300));
        assert!(config.cache.update_age_on_get);
        assert_eq!(config.server.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cache]\nmax_entries = 42\n\n[server]\nport = 8080").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.cache.max_entries, 42);
        assert_eq!(config.cache.default_ttl_seconds, 300);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database, DatabaseConfig::default());
    }

    #[test]
    fn test_invalid_file_values_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cache]\nmax_entries = 0").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_remote_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup_from(&[
                ("TURSO_DATABASE_URL", "libsql://demo.turso.io"),
                ("TURSO_AUTH_TOKEN", "secret"),
                ("USE_TURSO", "true"),
            ]))
            .unwrap();

        assert_eq!(
            config.database.remote_credentials(),
            Some(("libsql://demo.turso.io", "secret"))
        );
        assert!(config.database.force_remote);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_signals() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup_from(&[("NODE_ENV", "production")]))
            .unwrap();
        assert!(config.database.environment.is_production());

        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup_from(&[("VERCEL", "1"), ("NODE_ENV", "development")]))
            .unwrap();
        assert!(config.database.environment.is_production());

        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup_from(&[("APP_ENV", "test"), ("NODE_ENV", "production")]))
            .unwrap();
        assert_eq!(config.database.environment, Environment::Test);
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup_from(&[("TURSO_DATABASE_URL", "  "), ("VERCEL", "")]))
            .unwrap();
        assert_eq!(config.database.remote_url, None);
        assert!(!config.database.environment.is_production());
    }

    #[test]
    fn test_bad_override_values() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(lookup_from(&[("USE_TURSO", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = config
            .apply_overrides(lookup_from(&[("PULSEBOARD_PORT", "http")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_remote_url_scheme_validated() {
        let mut config = AppConfig::default();
        config.database.remote_url = Some("postgres://nope".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_monitor_interval_disabled() {
        let mut cache = CacheConfig::default();
        assert_eq!(cache.monitor_interval(), Some(Duration::from_secs(60)));
        cache.monitor_interval_seconds = 0;
        assert_eq!(cache.monitor_interval(), None);
    }
}
