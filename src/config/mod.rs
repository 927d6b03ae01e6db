//! Runtime configuration for the command line front end.
//!
//! `Config::from_env` reads the environment with development defaults.
//! Command line flags take precedence over anything loaded here.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable names.
pub const ENV_RULES_DIR: &str = "PAGERULE_RULES_DIR";
pub const ENV_LOG_FORMAT: &str = "PAGERULE_LOG_FORMAT";

/// Default development values used when environment variables are absent.
const DEFAULT_RULES_DIR: &str = "rules";
const DEFAULT_LOG_FORMAT: LogFormat = LogFormat::Text;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidValue {
                field: ENV_LOG_FORMAT,
                reason: format!("expected 'text' or 'json', got '{other}'"),
            }),
        }
    }
}

/// Application runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    rules_dir: PathBuf,
    log_format: LogFormat,
}

impl Config {
    pub fn new(rules_dir: impl Into<PathBuf>, log_format: LogFormat) -> Self {
        Self {
            rules_dir: rules_dir.into(),
            log_format,
        }
    }

    /// Load from environment variables, falling back to development defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let rules_dir = env::var(ENV_RULES_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_RULES_DIR));
        let log_format = match env::var(ENV_LOG_FORMAT) {
            Ok(value) => value.parse()?,
            Err(_) => DEFAULT_LOG_FORMAT,
        };
        Ok(Self {
            rules_dir,
            log_format,
        })
    }

    /// Directory the parser registry is loaded from.
    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_RULES_DIR, DEFAULT_LOG_FORMAT)
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}
