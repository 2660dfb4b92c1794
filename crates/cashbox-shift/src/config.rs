//! # Cashbox Configuration
//!
//! Configuration for the store, the history engine and automatic closure.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     CASHBOX_DB_PATH=/srv/cashbox/cashbox.db                            │
//! │     CASHBOX_MAX_CONNECTIONS=8                                          │
//! │     CASHBOX_AUTO_CLOSE_HOURS=18                                        │
//! │     CASHBOX_LOG=debug                                                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, or                                                │
//! │     ~/.config/cashbox/cashbox.toml (Linux)                             │
//! │     ~/Library/Application Support/com.cashbox.cashbox/... (macOS)      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # cashbox.toml
//! [database]
//! path = "/srv/cashbox/cashbox.db"
//! max_connections = 5
//! busy_timeout_secs = 5
//!
//! [history]
//! default_limit = 50     # 1..=100
//!
//! [auto_close]
//! max_open_hours = 24
//!
//! [logging]
//! filter = "info,cashbox=debug,sqlx=warn"
//! ```
//!
//! A malformed file or an unparseable environment value is an error, never
//! a silent default.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use cashbox_core::MAX_HISTORY_LIMIT;
use cashbox_db::DbConfig;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to the platform data directory.
    pub path: Option<PathBuf>,
    pub max_connections: u32,
    pub busy_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: 5,
            busy_timeout_secs: 5,
        }
    }
}

/// `[history]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Rows returned when a query gives no limit.
    pub default_limit: u32,
}

impl Default for HistorySettings {
    fn default() -> Self {
        HistorySettings {
            default_limit: cashbox_core::DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// `[auto_close]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoCloseSettings {
    /// OPEN sessions older than this are closed by `auto-close`.
    pub max_open_hours: u32,
}

impl Default for AutoCloseSettings {
    fn default() -> Self {
        AutoCloseSettings { max_open_hours: 24 }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// EnvFilter directive. `RUST_LOG` still wins when set.
    pub filter: Option<String>,
}

// =============================================================================
// Root
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftConfig {
    pub database: DatabaseSettings,
    pub history: HistorySettings,
    pub auto_close: AutoCloseSettings,
    pub logging: LoggingSettings,
}

impl ShiftConfig {
    /// Loads configuration from file (if present) and the environment.
    ///
    /// An explicit `config_path` must exist; the platform default path is
    /// optional.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = match config_path {
            Some(path) => {
                info!(?path, "Loading cashbox config from file");
                Self::from_toml(&std::fs::read_to_string(&path)?)?
            }
            None => match Self::default_config_path() {
                Some(path) if path.exists() => {
                    info!(?path, "Loading cashbox config from file");
                    Self::from_toml(&std::fs::read_to_string(&path)?)?
                }
                path => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `CASHBOX_*` overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
        if let Some(path) = lookup("CASHBOX_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(value) = lookup("CASHBOX_MAX_CONNECTIONS") {
            self.database.max_connections = parse_env("CASHBOX_MAX_CONNECTIONS", &value)?;
        }

        if let Some(value) = lookup("CASHBOX_AUTO_CLOSE_HOURS") {
            self.auto_close.max_open_hours = parse_env("CASHBOX_AUTO_CLOSE_HOURS", &value)?;
        }

        if let Some(filter) = lookup("CASHBOX_LOG") {
            self.logging.filter = Some(filter);
        }

        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if !(1..=MAX_HISTORY_LIMIT).contains(&self.history.default_limit) {
            return Err(ConfigError::Invalid(format!(
                "history.default_limit must be between 1 and {MAX_HISTORY_LIMIT}, got {}",
                self.history.default_limit
            )));
        }

        if self.auto_close.max_open_hours == 0 {
            return Err(ConfigError::Invalid(
                "auto_close.max_open_hours must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// The database file: configured path, else the platform data directory.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = project_dirs()
            .ok_or_else(|| ConfigError::Invalid("Could not determine app data directory".into()))?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;
        Ok(data_dir.join("cashbox.db"))
    }

    /// Store configuration for [`cashbox_db::Database::new`].
    pub fn db_config(&self) -> ConfigResult<DbConfig> {
        Ok(DbConfig::new(self.database_path()?)
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_secs(self.database.busy_timeout_secs)))
    }

    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("cashbox.toml"))
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "cashbox", "cashbox")
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{key} has an invalid value: '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = ShiftConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.history.default_limit, 50);
        assert_eq!(config.auto_close.max_open_hours, 24);
    }

    #[test]
    fn test_partial_file() {
        let config = ShiftConfig::from_toml(
            r#"
            [database]
            path = "/tmp/cashbox-test.db"

            [auto_close]
            max_open_hours = 12
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/cashbox-test.db")));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.auto_close.max_open_hours, 12);
        assert_eq!(config.history, HistorySettings::default());

        let db = config.db_config().unwrap();
        assert_eq!(db.database_path, PathBuf::from("/tmp/cashbox-test.db"));
        assert_eq!(db.busy_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CASHBOX_DB_PATH", "/srv/cashbox.db"),
            ("CASHBOX_MAX_CONNECTIONS", "8"),
            ("CASHBOX_AUTO_CLOSE_HOURS", "18"),
            ("CASHBOX_LOG", "warn"),
        ]);

        let mut config = ShiftConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database.path, Some(PathBuf::from("/srv/cashbox.db")));
        assert_eq!(config.database.max_connections, 8);
        assert_eq!(config.auto_close.max_open_hours, 18);
        assert_eq!(config.logging.filter.as_deref(), Some("warn"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = ShiftConfig::default();
        let err = config
            .apply_overrides(|key| (key == "CASHBOX_AUTO_CLOSE_HOURS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let config = ShiftConfig::from_toml("[history]\ndefault_limit = 500\n").unwrap();
        assert!(config.validate().is_err());

        assert!(matches!(
            ShiftConfig::from_toml("[database\npath = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let result = ShiftConfig::load(Some(PathBuf::from("/nonexistent/cashbox.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
