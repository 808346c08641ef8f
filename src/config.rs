//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::query::Interval;
use crate::store::InfluxConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub influx: InfluxConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Query compilation settings
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Bucket for date dimensions when a query names no interval
    #[serde(default = "default_interval")]
    pub default_interval: Interval,

    /// Append ` fill(0)` to grouped statements
    #[serde(default = "default_fill_zero")]
    pub fill_zero: bool,
}

fn default_interval() -> Interval {
    Interval::Day
}

fn default_fill_zero() -> bool {
    true
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_interval: default_interval(),
            fill_zero: default_fill_zero(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("influx-provider").join("config.toml")),
            Some(PathBuf::from("/etc/influx-provider/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `INFLUX_PROVIDER_*` overrides from a variable lookup
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Store overrides
        if let Some(url) = var("INFLUX_PROVIDER_URL") {
            self.influx.url = url;
        }
        if let Some(database) = var("INFLUX_PROVIDER_DATABASE") {
            self.influx.database = database;
        }
        if let Some(username) = var("INFLUX_PROVIDER_USERNAME") {
            self.influx.username = Some(username);
        }
        if let Some(password) = var("INFLUX_PROVIDER_PASSWORD") {
            self.influx.password = Some(password);
        }

        // API overrides
        if let Some(host) = var("INFLUX_PROVIDER_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("INFLUX_PROVIDER_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Logging overrides
        if let Some(level) = var("INFLUX_PROVIDER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("INFLUX_PROVIDER_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# InfluxDB Provider Configuration
#
# Environment variables override these settings:
# - INFLUX_PROVIDER_URL
# - INFLUX_PROVIDER_DATABASE
# - INFLUX_PROVIDER_USERNAME
# - INFLUX_PROVIDER_PASSWORD
# - INFLUX_PROVIDER_API_HOST
# - INFLUX_PROVIDER_API_PORT
# - INFLUX_PROVIDER_LOG_LEVEL
# - INFLUX_PROVIDER_LOG_FORMAT

[influx]
# InfluxDB base URL
url = "http://localhost:8086"

# Database holding the collections
database = "analytics"

# Basic auth credentials
# username = "reader"
# password = ""

# Request timeout (ms)
request_timeout_ms = 30000

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8082

# Allowed CORS origins (empty allows any)
cors_origins = []

# Request timeout in seconds
request_timeout_secs = 30

[query]
# Bucket used by date dimensions when a query names no interval:
# timebucket.second, timebucket.minute, timebucket.hour, timebucket.day, timebucket.week
default_interval = "timebucket.day"

# Fill empty groups with zero
fill_zero = true

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
