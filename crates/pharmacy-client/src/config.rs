//! # Client Configuration
//!
//! Configuration management for the pharmacy client.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PHARMACY_API_URL=http://pharmacy.local:5000                        │
//! │     PHARMACY_TIMEOUT_SECS=30                                           │
//! │     PHARMACY_STORAGE=memory                                            │
//! │     PHARMACY_STORAGE_PATH=/tmp/session.json                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/pharmacy-client/client.toml (Linux)                      │
//! │     ~/Library/Application Support/com.pharmacy.client/client.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://localhost:5000, no timeout, file-backed session             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [api]
//! base_url = "http://localhost:5000"
//! request_timeout_secs = 30   # omit for no timeout
//!
//! [storage]
//! backend = "file"            # file | memory
//! path = "/var/lib/pharmacy/session.json"
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pharmacy_core::DEFAULT_API_BASE_URL;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};
use crate::storage::{FileStorage, KeyValueStorage, MemoryStorage};

// =============================================================================
// API Settings
// =============================================================================

/// Where the backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Backend base URL (scheme + host + port).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout. `None` waits indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            request_timeout_secs: None,
        }
    }
}

impl ApiSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

// =============================================================================
// Storage Settings
// =============================================================================

/// Where the session is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// JSON file on disk; survives restarts.
    #[default]
    File,

    /// Process memory; forgotten on exit.
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::File => write!(f, "file"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" | "disk" => Ok(StorageBackend::File),
            "memory" | "mem" => Ok(StorageBackend::Memory),
            other => Err(ClientError::Config(format!(
                "Unknown storage backend: '{}'. Valid options: file, memory",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Session file location. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StorageSettings {
    /// Resolved session file path for the file backend.
    pub fn session_path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(FileStorage::default_path)
    }

    /// Builds the configured key/value storage.
    pub fn open(&self) -> ClientResult<Arc<dyn KeyValueStorage>> {
        match self.backend {
            StorageBackend::Memory => Ok(Arc::new(MemoryStorage::new())),
            StorageBackend::File => {
                let path = self.session_path().ok_or_else(|| {
                    ClientError::Config("No session file path available".into())
                })?;
                debug!(?path, "Using file-backed session storage");
                Ok(Arc::new(FileStorage::new(path)))
            }
        }
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl ClientConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (client.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path).map_err(|e| {
                    ClientError::Config(format!("failed to read {}: {}", path.display(), e))
                })?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ClientError::Config(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| {
            ClientError::Config(format!("failed to write {}: {}", path.display(), e))
        })?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = url::Url::parse(&self.api.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.api.request_timeout_secs == Some(0) {
            return Err(ClientError::Config(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any variable source (the environment in production).
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("PHARMACY_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Some(secs) = var("PHARMACY_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.api.request_timeout_secs = Some(s),
                Err(_) => warn!(value = %secs, "Ignoring non-numeric PHARMACY_TIMEOUT_SECS"),
            }
        }

        if let Some(backend) = var("PHARMACY_STORAGE") {
            match backend.parse() {
                Ok(parsed) => self.storage.backend = parsed,
                Err(_) => warn!(backend = %backend, "Unknown storage backend in environment"),
            }
        }

        if let Some(path) = var("PHARMACY_STORAGE_PATH") {
            self.storage.path = Some(PathBuf::from(path));
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "pharmacy", "client")
            .map(|dirs| dirs.config_dir().join("client.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_storage_backend_parsing() {
        assert_eq!("file".parse::<StorageBackend>().unwrap(), StorageBackend::File);
        assert_eq!("MEMORY".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:5000");
        assert_eq!(config.api.request_timeout(), None);
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();

        config.api.base_url = "ws://localhost:5000".into();
        assert!(config.validate().is_err());

        config.api.base_url = "localhost".into();
        assert!(config.validate().is_err());

        config.api.base_url = "https://pharmacy.example.com".into();
        assert!(config.validate().is_ok());

        config.api.request_timeout_secs = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PHARMACY_API_URL", "http://10.0.0.5:5000"),
            ("PHARMACY_TIMEOUT_SECS", "15"),
            ("PHARMACY_STORAGE", "memory"),
            ("PHARMACY_STORAGE_PATH", "/tmp/s.json"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "http://10.0.0.5:5000");
        assert_eq!(config.api.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.path, Some(PathBuf::from("/tmp/s.json")));
    }

    #[test]
    fn test_bad_overrides_are_ignored() {
        let mut config = ClientConfig::default();
        config.apply_overrides(|k| match k {
            "PHARMACY_TIMEOUT_SECS" => Some("soon".to_string()),
            "PHARMACY_STORAGE" => Some("tape".to_string()),
            _ => None,
        });
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");

        let mut config = ClientConfig::default();
        config.api.base_url = "http://pharmacy.local:5000".into();
        config.api.request_timeout_secs = Some(20);
        config.storage.backend = StorageBackend::Memory;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[api]"));
        assert!(contents.contains("[storage]"));

        let mut loaded: ClientConfig = toml::from_str(&contents).unwrap();
        loaded.validate().unwrap();
        assert_eq!(loaded, config);

        // partial files fall back to defaults per field
        loaded = toml::from_str("[api]\nbase_url = \"http://x:1\"\n").unwrap();
        assert_eq!(loaded.api.request_timeout_secs, None);
        assert_eq!(loaded.storage, StorageSettings::default());
    }

    #[test]
    fn test_unreadable_config_paths_are_named() {
        let dir = tempfile::tempdir().unwrap();

        // a directory where the file should be
        let err = ClientConfig::load(Some(dir.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, ClientError::Config(ref m) if m.starts_with("failed to read")));

        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let err = ClientConfig::default()
            .save(Some(blocker.join("client.toml")))
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(ref m) if m.contains("blocker")));
    }

    #[test]
    fn test_open_memory_storage() {
        let settings = StorageSettings {
            backend: StorageBackend::Memory,
            path: None,
        };
        let storage = settings.open().unwrap();
        storage.set("token", "abc").unwrap();
        assert_eq!(storage.get("token").unwrap().as_deref(), Some("abc"));
    }
}
