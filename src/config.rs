//! Configuration management for the upload store
//!
//! Separates startup configuration (requires restart) from runtime limits
//! (shared behind a lock so they can be adjusted while the server runs).

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Complete configuration as read from `config.toml` and the environment
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub limits: RuntimeLimits,
}

/// Network settings for the command listener (restart required)
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    /// IP address to bind the command listener
    pub bind_address: String,

    /// Port for the command listener; 0 picks an ephemeral port
    pub port: u16,

    /// Maximum length of a single command line
    pub max_command_length: usize,

    /// Idle timeout for a client session
    pub connection_timeout_secs: u64,
}

/// Filesystem layout of the store (restart required)
#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    /// Directory every upload lives under
    pub root: String,

    /// Fixed first segment of every relative path handed to callers
    pub upload_prefix: String,

    /// Chunk size used when streaming uploads to disk
    pub buffer_size: usize,
}

/// Limits that can be updated at runtime
#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeLimits {
    /// Maximum concurrent client sessions
    /// Environment: UNIDIR_LIMITS__MAX_CLIENTS
    pub max_clients: usize,

    /// Maximum upload size in MB
    /// Environment: UNIDIR_LIMITS__MAX_FILE_SIZE_MB
    pub max_file_size_mb: u64,
}

/// Thread-safe runtime limits wrapper
pub type SharedRuntimeLimits = Arc<RwLock<RuntimeLimits>>;

const CONFIG_PATHS: [&str; 2] = [
    "unidir-files/config", // container layout: /app/unidir-files/config.toml
    "config",              // local development: ./config.toml
];

impl AppConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut last_error = None;

        for config_path in CONFIG_PATHS {
            match Self::load_from(config_path) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    last_error = Some(e);
                    continue;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            config::ConfigError::Message(format!(
                "No configuration found. Tried: {CONFIG_PATHS:?}"
            ))
        }))
    }

    /// Load configuration from one file (extension optional) with environment overrides
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(config_path))
            .add_source(
                Environment::with_prefix("UNIDIR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Split into startup (immutable) and runtime (mutable) parts
    pub fn split(self) -> (ServerSettings, StorageSettings, SharedRuntimeLimits) {
        let limits = Arc::new(RwLock::new(self.limits));
        (self.server, self.storage, limits)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.server.max_command_length == 0 {
            return Err(config::ConfigError::Message(
                "max_command_length must be greater than 0".into(),
            ));
        }

        self.storage.validate()?;

        if self.limits.max_clients == 0 {
            return Err(config::ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.limits.max_file_size_mb == 0 {
            return Err(config::ConfigError::Message(
                "max_file_size_mb must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 2121,
            max_command_length: 1024,
            connection_timeout_secs: 30,
        }
    }
}

impl ServerSettings {
    /// Bind address and port as a socket address string
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Idle timeout as Duration
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: "./wwwroot".to_string(),
            upload_prefix: "uploads".to_string(),
            buffer_size: 8192,
        }
    }
}

impl StorageSettings {
    /// Storage root as PathBuf
    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(&self.root)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.root.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "storage root cannot be empty".into(),
            ));
        }

        let prefix = self.upload_prefix.trim();
        if prefix.is_empty()
            || prefix.contains(['/', '\\'])
            || prefix.contains("..")
            || prefix == "."
        {
            return Err(config::ConfigError::Message(format!(
                "upload_prefix must be a single plain segment, got {:?}",
                self.upload_prefix
            )));
        }

        if self.buffer_size == 0 {
            return Err(config::ConfigError::Message(
                "buffer_size must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

impl Default for RuntimeLimits {
    fn default() -> Self {
        Self {
            max_clients: 10,
            max_file_size_mb: 100,
        }
    }
}

impl RuntimeLimits {
    /// Maximum upload size in bytes
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}
