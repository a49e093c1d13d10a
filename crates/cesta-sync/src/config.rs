//! Configuration for the sync layer.
//!
//! Loaded from TOML; every field has a default, so a missing or partial
//! file is fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Sync layer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Remote database path; falls back to the platform data dir
    pub database_path: Option<PathBuf>,
    /// Local cache path; falls back to the platform data dir
    pub cache_path: Option<PathBuf>,
    /// Change feed reconnect tuning
    pub backoff: BackoffConfig,
}

/// Reconnect backoff for the change feed. Delays double from `initial_ms`
/// up to `max_ms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// First retry delay in milliseconds
    pub initial_ms: u64,
    /// Upper bound for the doubling delay in milliseconds
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_ms: 500,
            max_ms: 30_000, // 30 seconds
        }
    }
}

impl BackoffConfig {
    pub fn initial(&self) -> Duration {
        Duration::from_millis(self.initial_ms)
    }

    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }
}

impl SyncConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;
        let config: SyncConfig =
            toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the platform config location, falling back to defaults
    /// when no file exists there.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Platform location for the config file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cesta").join("config.toml"))
    }

    /// Remote database path, configured or platform default.
    pub fn resolve_database_path(&self) -> Option<PathBuf> {
        self.database_path
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("cesta").join("remote.db")))
    }

    /// Local cache path, configured or platform default.
    pub fn resolve_cache_path(&self) -> Option<PathBuf> {
        self.cache_path
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("cesta").join("cache.db")))
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backoff.initial_ms == 0 {
            return Err(ConfigError::Invalid(
                "backoff.initial_ms must be positive".to_string(),
            ));
        }
        if self.backoff.initial_ms > self.backoff.max_ms {
            return Err(ConfigError::Invalid(
                "backoff.initial_ms must not exceed backoff.max_ms".to_string(),
            ));
        }
        Ok(())
    }
}

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = SyncConfig::default();
        config.validate().unwrap();
        assert_eq!(config.backoff.initial_ms, 500);
        assert_eq!(config.backoff.max_ms, 30_000);
        assert_eq!(config.database_path, None);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: SyncConfig = toml::from_str(
            r#"
            database_path = "/tmp/remote.db"

            [backoff]
            initial_ms = 100
            "#,
        )
        .unwrap();
        assert_eq!(
            config.database_path.as_deref(),
            Some(Path::new("/tmp/remote.db"))
        );
        assert_eq!(config.backoff.initial_ms, 100);
        assert_eq!(config.backoff.max_ms, 30_000);
    }

    #[test]
    fn zero_initial_backoff_is_rejected() {
        let mut config = SyncConfig::default();
        config.backoff.initial_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn initial_above_max_is_rejected() {
        let mut config = SyncConfig::default();
        config.backoff.initial_ms = 60_000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = SyncConfig::load(Path::new("/nonexistent/cesta.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }

    #[test]
    fn load_validates_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backoff]\ninitial_ms = 0\n").unwrap();
        let err = SyncConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn explicit_paths_win_over_platform_defaults() {
        let config = SyncConfig {
            database_path: Some(PathBuf::from("/tmp/db.sqlite")),
            ..SyncConfig::default()
        };
        assert_eq!(
            config.resolve_database_path().as_deref(),
            Some(Path::new("/tmp/db.sqlite"))
        );
    }
}
