//! Application configuration.
//!
//! # Responsibility
//! - Layer configuration sources: built-in defaults, an optional TOML file,
//!   then `NOTEKEEPER_`-prefixed environment variables.
//! - Validate resolved values before any subsystem starts.

use crate::logging::{default_log_level, normalize_level};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable prefix for configuration overrides.
pub const CONFIG_ENV_PREFIX: &str = "NOTEKEEPER_";

const DEFAULT_DB_FILE_NAME: &str = "notekeeper.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "notekeeper-logs";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = std::env::temp_dir();
        AppConfig {
            db_path: data_dir.join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: data_dir.join(DEFAULT_LOG_DIR_NAME),
        }
    }
}

impl AppConfig {
    /// Resolves configuration from defaults, `config_file` and environment.
    ///
    /// A missing `config_file` is not an error; the file layer is skipped.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config: AppConfig = Self::figment(config_file)
            .extract()
            .map_err(|err| ConfigError::Extract(Box::new(err)))?;
        config.validate()?;
        Ok(config)
    }

    /// Provider stack used by `load`.
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(CONFIG_ENV_PREFIX))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDbPath);
        }
        normalize_level(&self.log_level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))?;
        if !self.log_dir.is_absolute() {
            return Err(ConfigError::RelativeLogDir(self.log_dir.clone()));
        }
        Ok(())
    }
}

/// Configuration loading failures.
#[derive(Debug)]
pub enum ConfigError {
    Extract(Box<figment::Error>),
    EmptyDbPath,
    InvalidLogLevel(String),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extract(err) => write!(f, "invalid configuration: {err}"),
            Self::EmptyDbPath => write!(f, "db_path must not be empty"),
            Self::InvalidLogLevel(level) => write!(
                f,
                "unsupported log_level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::RelativeLogDir(dir) => {
                write!(f, "log_dir must be an absolute path, got `{}`", dir.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Extract(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
