//! Configuration loading and root folder resolution
//!
//! Root folder priority:
//! 1. Command-line argument (highest priority)
//! 2. `PANCHANG_ROOT_FOLDER` environment variable
//! 3. `root_folder` in the TOML config file
//! 4. OS-dependent default (fallback)
//!
//! A missing or malformed TOML file never prevents startup: a warning is
//! logged and defaults are used.

use crate::engine::DEFAULT_UTC_OFFSET_MINUTES;
use crate::model::{GeoCoordinate, DEFAULT_LATITUDE, DEFAULT_LONGITUDE};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "PANCHANG_ROOT_FOLDER";

/// Environment variable overriding the HTTP port
pub const PORT_ENV: &str = "PANCHANG_PORT";

/// Environment variable carrying the enrichment service API key
pub const ENRICHMENT_API_KEY_ENV: &str = "PANCHANG_ENRICHMENT_API_KEY";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "panchang.db";

pub const DEFAULT_PORT: u16 = 5780;

/// Cache namespace; bump to invalidate every stored month
pub const DEFAULT_NAMESPACE: &str = "panchang_cache_v1";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub port: Option<u16>,
    pub logging: LoggingConfig,
    pub enrichment: EnrichmentConfig,
    pub sync: SyncConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Remote enrichment service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Service endpoint; `None` selects the offline provider
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Minimum spacing between outbound calls
    pub min_interval_ms: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: 120,
            min_interval_ms: 500,
        }
    }
}

/// Sync and prefetch behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Months fetched on each side of the requested month
    pub prefetch_radius_months: u32,
    /// Pause between prefetch items
    pub prefetch_throttle_ms: u64,
    pub utc_offset_minutes: i32,
    /// Used for computation when a request carries no location
    pub default_latitude: f64,
    pub default_longitude: f64,
    pub namespace: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            prefetch_radius_months: 6,
            prefetch_throttle_ms: 500,
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            default_latitude: DEFAULT_LATITUDE,
            default_longitude: DEFAULT_LONGITUDE,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl SyncConfig {
    /// Fallback coordinate, validated
    pub fn default_location(&self) -> Result<GeoCoordinate> {
        GeoCoordinate::new(self.default_latitude, self.default_longitude)
            .map_err(|e| Error::Config(format!("sync.default_latitude/longitude: {}", e)))
    }
}

/// Persistent store limits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// SQLite `max_page_count` pragma; 0 leaves the database unbounded
    pub max_page_count: u32,
}

/// Default config file location (`~/.config/panchang/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("panchang").join("config.toml"))
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("panchang"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/panchang"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("panchang"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\panchang"))
    } else {
        dirs::data_local_dir()
            .map(|d| d.join("panchang"))
            .unwrap_or_else(|| PathBuf::from("./panchang_data"))
    }
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

/// Load the config at `path` (or the default location), falling back to defaults
pub fn load_or_default(path: Option<&Path>) -> TomlConfig {
    let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(p) => p,
        None => {
            warn!("Could not determine config directory, using defaults");
            return TomlConfig::default();
        }
    };

    if !path.exists() {
        debug!(path = %path.display(), "Config file not found, using defaults");
        return TomlConfig::default();
    }

    match load_toml_config(&path) {
        Ok(config) => {
            debug!(path = %path.display(), "Loaded config file");
            config
        }
        Err(e) => {
            warn!(error = %e, "Config file unreadable, using defaults");
            TomlConfig::default()
        }
    }
}

/// Write a config file atomically (temp file + rename)
///
/// On Unix the file is restricted to the owner since it may hold an API key.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Resolves the root folder from CLI, environment, TOML and platform default
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cli(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    pub fn with_toml(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = &self.toml_root {
            return path.clone();
        }

        // Priority 4: OS-dependent default
        default_root_folder()
    }
}

/// Creates the root folder and locates the database inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Idempotent
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.join(DATABASE_FILE)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = TomlConfig::default();
        assert_eq!(config.enrichment.timeout_secs, 120);
        assert_eq!(config.enrichment.min_interval_ms, 500);
        assert_eq!(config.sync.prefetch_radius_months, 6);
        assert_eq!(config.sync.utc_offset_minutes, 330);
        assert_eq!(config.sync.namespace, "panchang_cache_v1");
        assert_eq!(config.cache.max_page_count, 0);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_fills_missing_sections() {
        let config: TomlConfig = toml::from_str(
            r#"
            port = 9000

            [sync]
            prefetch_radius_months = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.port, Some(9000));
        assert_eq!(config.sync.prefetch_radius_months, 2);
        assert_eq!(config.sync.prefetch_throttle_ms, 500);
        assert!(config.enrichment.endpoint.is_none());
    }

    #[test]
    fn test_invalid_default_location_is_config_error() {
        let sync = SyncConfig {
            default_latitude: 123.0,
            ..SyncConfig::default()
        };
        assert!(matches!(sync.default_location(), Err(Error::Config(_))));
    }
}
