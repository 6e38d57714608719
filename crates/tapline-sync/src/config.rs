//! # Tapline Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TAPLINE_API_URL=https://api.punkapi.com                            │
//! │     TAPLINE_FORCE_REFRESH=false                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tapline/tapline.toml (Linux)                             │
//! │     ~/Library/Application Support/com.tapline.tapline/tapline.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [api]
//! base_url = "https://api.punkapi.com"
//! auth_url = "https://artoo-develop.k8s-facile.it/api/v1/security/session"
//! page_size = 80
//! timeout_secs = 30
//!
//! [cache]
//! force_refresh_on_open = true
//!
//! [database]
//! path = "/var/lib/tapline/tapline.db"   # optional
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};

// =============================================================================
// API Settings
// =============================================================================

/// Remote endpoints and HTTP behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Root of the item listing API; `/v2/beers` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Full URL the credential is posted to.
    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    /// `per_page` query parameter of the listing request.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Connect and request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.punkapi.com".to_string()
}

fn default_auth_url() -> String {
    "https://artoo-develop.k8s-facile.it/api/v1/security/session".to_string()
}

fn default_page_size() -> u32 {
    80
}

fn default_timeout() -> u64 {
    30
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            auth_url: default_auth_url(),
            page_size: default_page_size(),
            timeout_secs: default_timeout(),
        }
    }
}

// =============================================================================
// Cache Settings
// =============================================================================

/// Refresh behavior of the item list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Whether opening the item list forces a fetch regardless of freshness.
    #[serde(default = "default_true")]
    pub force_refresh_on_open: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            force_refresh_on_open: true,
        }
    }
}

// =============================================================================
// Database Settings
// =============================================================================

/// Where the local store lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. `None` means the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete Tapline configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaplineConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub database: DatabaseSettings,
}

impl TaplineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (tapline.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        for (name, url) in [("base_url", &self.api.base_url), ("auth_url", &self.api.auth_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(SyncError::InvalidUrl(format!(
                    "{} must start with http:// or https://, got: {}",
                    name, url
                )));
            }
        }

        if self.api.page_size == 0 {
            return Err(SyncError::InvalidConfig(
                "page_size must be greater than 0".into(),
            ));
        }

        if self.api.timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup (the environment in production).
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("TAPLINE_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Some(url) = lookup("TAPLINE_AUTH_URL") {
            debug!(url = %url, "Overriding auth URL from environment");
            self.api.auth_url = url;
        }

        if let Some(size) = lookup("TAPLINE_PAGE_SIZE") {
            match size.parse::<u32>() {
                Ok(size) => self.api.page_size = size,
                Err(_) => warn!(value = %size, "Ignoring non-numeric TAPLINE_PAGE_SIZE"),
            }
        }

        if let Some(path) = lookup("TAPLINE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(flag) = lookup("TAPLINE_FORCE_REFRESH") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.cache.force_refresh_on_open = true,
                "0" | "false" | "no" | "off" => self.cache.force_refresh_on_open = false,
                _ => warn!(value = %flag, "Unknown TAPLINE_FORCE_REFRESH value"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tapline", "tapline")
            .map(|dirs| dirs.config_dir().join("tapline.toml"))
    }

    /// Database file to open: the configured path, else the platform data
    /// directory.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database.path.clone().or_else(|| {
            directories::ProjectDirs::from("com", "tapline", "tapline")
                .map(|dirs| dirs.data_dir().join("tapline.db"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = TaplineConfig::default();
        assert_eq!(config.api.base_url, "https://api.punkapi.com");
        assert_eq!(config.api.page_size, 80);
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.cache.force_refresh_on_open);
        assert!(config.database.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = TaplineConfig::default();

        config.api.base_url = "ftp://api.punkapi.com".to_string();
        assert!(matches!(config.validate(), Err(SyncError::InvalidUrl(_))));

        config.api.base_url = "http://localhost:8080".to_string();
        assert!(config.validate().is_ok());

        config.api.page_size = 0;
        assert!(matches!(config.validate(), Err(SyncError::InvalidConfig(_))));

        config.api.page_size = 10;
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: TaplineConfig = toml::from_str(
            r#"
            [api]
            page_size = 25

            [cache]
            force_refresh_on_open = false
            "#,
        )
        .unwrap();

        assert_eq!(config.api.page_size, 25);
        assert_eq!(config.api.base_url, default_base_url());
        assert!(!config.cache.force_refresh_on_open);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TAPLINE_API_URL", "http://127.0.0.1:9000"),
            ("TAPLINE_PAGE_SIZE", "not-a-number"),
            ("TAPLINE_DB_PATH", "/tmp/tapline-test.db"),
            ("TAPLINE_FORCE_REFRESH", "off"),
        ]
        .into_iter()
        .collect();

        let mut config = TaplineConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.api.page_size, 80);
        assert_eq!(config.database_path(), Some(PathBuf::from("/tmp/tapline-test.db")));
        assert!(!config.cache.force_refresh_on_open);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tapline.toml");

        let mut config = TaplineConfig::default();
        config.api.page_size = 12;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[api]"));
        assert!(contents.contains("[cache]"));

        let loaded: TaplineConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tapline.toml");
        std::fs::write(&path, "[api\npage_size = ").unwrap();

        let err = TaplineConfig::load(Some(path)).unwrap_err();
        assert!(matches!(err, SyncError::ConfigLoadFailed(_)));
    }
}
