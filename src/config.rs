//! Application configuration.
//!
//! Configuration comes from an optional TOML file with every field
//! defaulted, then from environment overrides:
//!
//! | Variable | Field |
//! |---|---|
//! | `PORT` | `server.port` |
//! | `TASKTIDE_HOST` | `server.host` |
//! | `TASKTIDE_DATA_FILE` | `storage.data_file` |
//! | `TASKTIDE_LOG` | `logging.filter` |

use crate::task::services::LifecyclePolicy;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use chrono::TimeDelta;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Longest accepted sweep interval, one day.
const MAX_SWEEP_INTERVAL_SECS: u64 = 86_400;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that was read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`AppConfig`].
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// File that was parsed.
        path: Utf8PathBuf,
        /// Parser error.
        source: Box<toml::de::Error>,
    },

    /// An environment override holds an unusable value.
    #[error("environment variable {name} has invalid value {value:?}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Rejected value.
        value: String,
    },

    /// A field value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Persistence settings.
    pub storage: StorageConfig,
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Timing windows for automatic transitions.
    pub lifecycle: LifecycleConfig,
    /// Notification settings.
    pub notifications: NotificationsConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// `[storage]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// JSON file holding the task collection.
    pub data_file: Utf8PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: Utf8PathBuf::from("tasks.json"),
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind; `0` picks a free port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 3000,
        }
    }
}

/// `[lifecycle]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LifecycleConfig {
    /// Seconds between sweeps.
    pub sweep_interval_secs: u64,
    /// Minutes an `ongoing` task may stay past due before it is missed.
    pub grace_period_minutes: u32,
    /// Minutes before the due date that the reminder fires.
    pub reminder_lead_minutes: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 60,
            grace_period_minutes: 60,
            reminder_lead_minutes: 60,
        }
    }
}

/// `[notifications]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotificationsConfig {
    /// Whether OS notifications are permitted.
    pub desktop: bool,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { desktop: true }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
        }
    }
}

impl AppConfig {
    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read,
    /// [`ConfigError::Parse`] when it is not valid configuration and
    /// [`ConfigError::Invalid`] when a value is out of range.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = read_file(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source: Box::new(source),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when `PORT` is not a port
    /// number.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup("PORT") {
            self.server.port = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv {
                    name: "PORT",
                    value,
                })?;
        }
        if let Some(host) = lookup("TASKTIDE_HOST") {
            self.server.host = host;
        }
        if let Some(data_file) = lookup("TASKTIDE_DATA_FILE") {
            self.storage.data_file = Utf8PathBuf::from(data_file);
        }
        if let Some(filter) = lookup("TASKTIDE_LOG") {
            self.logging.filter = filter;
        }
        Ok(())
    }

    /// Applies overrides from the process environment.
    ///
    /// # Errors
    ///
    /// As [`Self::apply_env_overrides`].
    pub fn apply_process_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_overrides(|name| std::env::var(name).ok())
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a sweep interval that is zero or
    /// longer than a day, a zero grace period or reminder lead, or an empty
    /// data file path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lifecycle.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid("lifecycle.sweep_interval_secs must be positive"));
        }
        if self.lifecycle.sweep_interval_secs > MAX_SWEEP_INTERVAL_SECS {
            return Err(ConfigError::Invalid(
                "lifecycle.sweep_interval_secs must be at most 86400",
            ));
        }
        if self.lifecycle.grace_period_minutes == 0 {
            return Err(ConfigError::Invalid("lifecycle.grace_period_minutes must be positive"));
        }
        if self.lifecycle.reminder_lead_minutes == 0 {
            return Err(ConfigError::Invalid("lifecycle.reminder_lead_minutes must be positive"));
        }
        if self.storage.data_file.as_str().trim().is_empty() {
            return Err(ConfigError::Invalid("storage.data_file must not be empty"));
        }
        Ok(())
    }

    /// Timing policy for the lifecycle engine.
    #[must_use]
    pub fn lifecycle_policy(&self) -> LifecyclePolicy {
        LifecyclePolicy {
            grace_period: TimeDelta::minutes(i64::from(self.lifecycle.grace_period_minutes)),
            reminder_lead: TimeDelta::minutes(i64::from(self.lifecycle.reminder_lead_minutes)),
            sweep_interval: Duration::from_secs(self.lifecycle.sweep_interval_secs),
        }
    }
}

fn read_file(path: &Utf8Path) -> std::io::Result<String> {
    let file_name = path
        .file_name()
        .ok_or_else(|| std::io::Error::other("path must include a file name"))?;
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    dir.read_to_string(file_name)
}
