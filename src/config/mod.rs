//! Configuration loading and validation.
//!
//! Layers, lowest precedence first: built-in defaults, an optional TOML file,
//! `GAMECALC__SECTION__KEY` environment variables, then the conventional
//! `RIOT_API_KEY`, `BLIZZARD_CLIENT_ID` and `BLIZZARD_CLIENT_SECRET`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sources::blizzard::SUPPORTED_REGIONS;
use crate::sources::riot::{Platform, MAX_MATCH_COUNT};

pub const ENV_PREFIX: &str = "GAMECALC";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(#[from] ::config::ConfigError),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Outbound HTTP settings shared by every upstream client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Attempts per request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

fn default_timeout() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
        }
    }
}

/// Riot Games API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiotConfig {
    pub api_key: Option<String>,

    /// Platform used when none is given (CLI only)
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Recent matches fetched per profile
    #[serde(default = "default_match_count")]
    pub match_count: u32,
}

fn default_platform() -> String {
    "na1".to_string()
}

fn default_match_count() -> u32 {
    5
}

impl Default for RiotConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            platform: default_platform(),
            match_count: default_match_count(),
        }
    }
}

/// Blizzard Battle.net configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlizzardConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_region() -> String {
    "us".to_string()
}

fn default_locale() -> String {
    "en_US".to_string()
}

impl Default for BlizzardConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            region: default_region(),
            locale: default_locale(),
        }
    }
}

/// Upstream response cache TTLs, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Static data: versions, champions, realms
    #[serde(default = "default_static_ttl")]
    pub static_ttl_seconds: u64,

    #[serde(default = "default_profile_ttl")]
    pub profile_ttl_seconds: u64,

    #[serde(default = "default_hiscores_ttl")]
    pub hiscores_ttl_seconds: u64,
}

fn default_static_ttl() -> u64 {
    3600
}

fn default_profile_ttl() -> u64 {
    120
}

fn default_hiscores_ttl() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            static_ttl_seconds: default_static_ttl(),
            profile_ttl_seconds: default_profile_ttl(),
            hiscores_ttl_seconds: default_hiscores_ttl(),
        }
    }
}

impl CacheConfig {
    pub fn static_ttl(&self) -> Duration {
        Duration::from_secs(self.static_ttl_seconds)
    }

    pub fn profile_ttl(&self) -> Duration {
        Duration::from_secs(self.profile_ttl_seconds)
    }

    pub fn hiscores_ttl(&self) -> Duration {
        Duration::from_secs(self.hiscores_ttl_seconds)
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub riot: RiotConfig,

    #[serde(default)]
    pub blizzard: BlizzardConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            server: ServerConfig::default(),
            http: HttpConfig::default(),
            riot: RiotConfig::default(),
            blizzard: BlizzardConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Load from an optional TOML file layered with the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }
        builder = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("riot.api_key", std::env::var("RIOT_API_KEY").ok())?
            .set_override_option("blizzard.client_id", std::env::var("BLIZZARD_CLIENT_ID").ok())?
            .set_override_option(
                "blizzard.client_secret",
                std::env::var("BLIZZARD_CLIENT_SECRET").ok(),
            )?;

        let mut config: AppConfig = builder.build()?.try_deserialize()?;
        config.riot.api_key = non_empty(config.riot.api_key.take());
        config.blizzard.client_id = non_empty(config.blizzard.client_id.take());
        config.blizzard.client_secret = non_empty(config.blizzard.client_secret.take());
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.http.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "HTTP timeout must be greater than 0".to_string(),
            ));
        }

        if self.http.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "HTTP max_attempts must be at least 1".to_string(),
            ));
        }

        if self.riot.match_count > MAX_MATCH_COUNT {
            return Err(ConfigError::ValidationError(format!(
                "Riot match_count must be at most {}",
                MAX_MATCH_COUNT
            )));
        }

        self.riot
            .platform
            .parse::<Platform>()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if !SUPPORTED_REGIONS.contains(&self.blizzard.region.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Blizzard region must be one of {:?}",
                SUPPORTED_REGIONS
            )));
        }

        Ok(())
    }

    /// Copy with credentials masked, for display.
    pub fn redacted(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "********".to_string());
        let mut config = self.clone();
        config.riot.api_key = mask(&self.riot.api_key);
        config.blizzard.client_id = mask(&self.blizzard.client_id);
        config.blizzard.client_secret = mask(&self.blizzard.client_secret);
        config
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.riot.platform, "na1");
        assert_eq!(config.riot.match_count, 5);
        assert_eq!(config.blizzard.region, "us");
        assert_eq!(config.cache.profile_ttl(), Duration::from_secs(120));
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_timeout() {
        let mut config = AppConfig::default();
        config.http.timeout_seconds = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_platform() {
        let mut config = AppConfig::default();
        config.riot.platform = "moon1".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_region() {
        let mut config = AppConfig::default();
        config.blizzard.region = "cn".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_match_count() {
        let mut config = AppConfig::default();
        config.riot.match_count = 50;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("game-calc.toml");
        std::fs::write(
            &path,
            r#"
log_level = "debug"

[server]
port = 9090

[blizzard]
region = "eu"
locale = "en_GB"
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.blizzard.region, "eu");
        assert_eq!(config.cache.static_ttl_seconds, 3600);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(Some(dir.path().join("absent.toml").as_path())).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[server]\nport = 0\n").unwrap();

        let err = AppConfig::load(Some(path.as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_redacted_masks_secrets() {
        let mut config = AppConfig::default();
        config.riot.api_key = Some("RGAPI-secret".to_string());

        let redacted = config.redacted();
        assert_eq!(redacted.riot.api_key.as_deref(), Some("********"));
        assert!(redacted.blizzard.client_id.is_none());
        assert!(!redacted.to_toml().unwrap().contains("RGAPI-secret"));
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = config.to_toml().unwrap();

        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.data_dir, parsed.data_dir);
        assert_eq!(config.server.port, parsed.server.port);
    }
}
