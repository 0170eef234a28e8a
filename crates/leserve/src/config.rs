//! Server configuration from TOML or environment

use leregistre::StorageConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Default host address
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port number
pub const DEFAULT_PORT: u16 = 5000;

/// Default database file
pub const DEFAULT_DB_PATH: &str = "leconseil.db";

/// Default CORS origins (admin dashboard dev servers)
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
];

/// Accepted values for `log_level`
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Errors raised while reading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        /// File that was requested
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`ServerConfig`]
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// File that was requested
        path: String,
        /// Underlying parse error
        #[source]
        source: toml::de::Error,
    },
}

/// Server configuration loaded from TOML
///
/// Missing keys fall back to their defaults, so a file only needs the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Allowed CORS origins
    pub cors_origins: Vec<String>,

    /// Path to SQLite database
    pub db_path: String,

    /// Log level for tracing
    pub log_level: String,

    /// Enable SQLite WAL journaling
    pub wal_enabled: bool,

    /// SQLite page cache size
    pub cache_size_pages: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let storage = StorageConfig::default();
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            cors_origins: Self::default_cors_origins(),
            db_path: Self::default_db_path(),
            log_level: Self::default_log_level(),
            wal_enabled: storage.wal_enabled,
            cache_size_pages: storage.cache_size_pages,
        }
    }
}

impl ServerConfig {
    fn default_host() -> String {
        DEFAULT_HOST.to_string()
    }

    fn default_port() -> u16 {
        DEFAULT_PORT
    }

    fn default_cors_origins() -> Vec<String> {
        DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect()
    }

    fn default_db_path() -> String {
        DEFAULT_DB_PATH.to_string()
    }

    fn default_log_level() -> String {
        "info".to_string()
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load config from environment variables with fallback to defaults
    ///
    /// Environment variables:
    /// - `LECONSEIL_HOST` - Server host
    /// - `LECONSEIL_PORT` - Server port
    /// - `LECONSEIL_DB_PATH` - Database path
    /// - `LECONSEIL_LOG_LEVEL` - Log level (trace, debug, info, warn, error)
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overlay `LECONSEIL_*` environment variables onto this config
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overlay values from a variable lookup onto this config
    ///
    /// An unparsable `LECONSEIL_PORT` is ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("LECONSEIL_HOST") {
            self.host = host;
        }

        if let Some(port) = lookup("LECONSEIL_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }

        if let Some(db_path) = lookup("LECONSEIL_DB_PATH") {
            self.db_path = db_path;
        }

        if let Some(log_level) = lookup("LECONSEIL_LOG_LEVEL") {
            self.log_level = log_level;
        }
    }

    /// SQLite options derived from this config
    #[must_use]
    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            wal_enabled: self.wal_enabled,
            cache_size_pages: self.cache_size_pages,
        }
    }

    /// Get the socket address for the server
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("Invalid address: {}", e))
    }

    /// Get the full server URL (e.g., "http://127.0.0.1:5000")
    #[must_use]
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be zero".to_string());
        }

        if self.host.is_empty() {
            return Err("Host cannot be empty".to_string());
        }

        if self.db_path.is_empty() {
            return Err("Database path cannot be empty".to_string());
        }

        if self.cors_origins.is_empty() {
            return Err("At least one CORS origin is required".to_string());
        }

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            ));
        }

        Ok(())
    }
}
