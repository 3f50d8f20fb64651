//! Client configuration file.
//!
//! # Responsibility
//! - Load `ClientConfig` from an optional TOML file.
//! - Apply environment overrides on top of file values.
//!
//! # Invariants
//! - A missing file yields defaults; a malformed file is an error.
//! - Durations are clamped to usable minimums when read.

use crate::api::{ApiConfig, DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
use crate::logging::LogLevel;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `api_token`.
pub const TOKEN_ENV_VAR: &str = "ECHO_API_TOKEN";
/// Environment variable that overrides `api_base_url`.
pub const API_URL_ENV_VAR: &str = "ECHO_API_URL";

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const MIN_POLL_INTERVAL_SECS: u64 = 5;
pub const DATABASE_FILE_NAME: &str = "echo_client.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, message: String },
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse { path, message } => {
                write!(f, "invalid config `{}`: {message}", path.display())
            }
            Self::InvalidLogLevel(level) => write!(f, "invalid log_level `{level}`"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Settings for the command-line client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    pub poll_interval_secs: u64,
    /// Database and log location; platform data dir when unset.
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            data_dir: None,
            log_level: None,
        }
    }
}

impl ClientConfig {
    /// Reads `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("event=config_load module=config status=default reason=missing_file");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::from_toml(&raw).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, String> {
        toml::from_str(raw).map_err(|err| err.to_string())
    }

    /// Default config file location under the platform config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("echo").join("config.toml"))
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Applies overrides from `lookup`; blank values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(token) = non_blank(TOKEN_ENV_VAR) {
            self.api_token = Some(token.trim().to_string());
        }
        if let Some(url) = non_blank(API_URL_ENV_VAR) {
            self.api_base_url = url.trim().to_string();
        }
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api_base_url.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            token: self.api_token.clone(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(MIN_POLL_INTERVAL_SECS))
    }

    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        match &self.log_level {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidLogLevel(raw.clone())),
            None => Ok(LogLevel::build_default()),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("echo")
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join(DATABASE_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ClientConfig::load(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.request_timeout_secs, 45);
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "api_base_url = \"https://echo.example.com/api/v1\"\npoll_interval_secs = 1\n",
        )
        .expect("write config");

        let config = ClientConfig::load(&path).expect("load");
        assert_eq!(config.api_base_url, "https://echo.example.com/api/v1");
        assert_eq!(config.poll_interval(), Duration::from_secs(MIN_POLL_INTERVAL_SECS));
        assert_eq!(config.api_config().timeout, Duration::from_secs(45));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "poll_interval_secs = \"often\"").expect("write config");

        let err = ClientConfig::load(&path).expect_err("must fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn env_token_overrides_file_and_blank_is_ignored() {
        let mut config = ClientConfig {
            api_token: Some("from-file".to_string()),
            ..ClientConfig::default()
        };
        config.apply_overrides(|name| (name == TOKEN_ENV_VAR).then(|| " from-env ".to_string()));
        assert_eq!(config.api_token.as_deref(), Some("from-env"));

        config.apply_overrides(|_| Some("   ".to_string()));
        assert_eq!(config.api_token.as_deref(), Some("from-env"));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn paths_follow_data_dir() {
        let config = ClientConfig {
            data_dir: Some(PathBuf::from("/var/lib/echo")),
            ..ClientConfig::default()
        };
        assert_eq!(
            config.database_path(),
            PathBuf::from("/var/lib/echo").join(DATABASE_FILE_NAME)
        );
        assert_eq!(config.log_dir(), PathBuf::from("/var/lib/echo/logs"));
    }

    #[test]
    fn log_level_parses_or_defaults() {
        let mut config = ClientConfig::default();
        assert_eq!(config.log_level().expect("default"), LogLevel::build_default());
        config.log_level = Some("warn".to_string());
        assert_eq!(config.log_level().expect("warn"), LogLevel::Warn);
        config.log_level = Some("chatty".to_string());
        assert!(config.log_level().is_err());
    }
}
