//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::fetch::HubClientConfig;
use crate::models::TeamInfo;
use crate::session::SessionSettings;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Remote statistics service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsServiceConfig {
    /// Service root, e.g. "https://hub.example.org/api/v1"
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Max head-to-head games per request
    #[serde(default = "default_list_limit", skip_serializing_if = "Option::is_none")]
    pub h2h_limit: Option<u32>,

    /// Max form games per team per request
    #[serde(default = "default_list_limit", skip_serializing_if = "Option::is_none")]
    pub form_limit: Option<u32>,
}

fn default_base_url() -> String {
    "http://localhost:3000/api/v1".to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_user_agent() -> String {
    format!("match-analytics/{}", env!("CARGO_PKG_VERSION"))
}

fn default_list_limit() -> Option<u32> {
    Some(10)
}

impl Default for StatsServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
            h2h_limit: default_list_limit(),
            form_limit: default_list_limit(),
        }
    }
}

/// Comparison session defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_period_months")]
    pub default_period_months: u32,

    /// Longest lookback a session may ask for
    #[serde(default = "default_max_period_months")]
    pub max_period_months: u32,
}

fn default_period_months() -> u32 {
    3
}

fn default_max_period_months() -> u32 {
    24
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_period_months: default_period_months(),
            max_period_months: default_max_period_months(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub stats_service: StatsServiceConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub server: ServerConfig,

    /// Team directory entries
    #[serde(default)]
    pub teams: Vec<TeamInfo>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            stats_service: StatsServiceConfig::default(),
            session: SessionConfig::default(),
            server: ServerConfig::default(),
            teams: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stats_service.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Stats service timeout must be greater than 0".to_string(),
            ));
        }

        if url::Url::parse(&self.stats_service.base_url).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "Stats service base_url is not a valid URL: {}",
                self.stats_service.base_url
            )));
        }

        if self.session.default_period_months == 0 {
            return Err(ConfigError::ValidationError(
                "Default period must be at least one month".to_string(),
            ));
        }

        if self.session.max_period_months < self.session.default_period_months {
            return Err(ConfigError::ValidationError(format!(
                "Maximum period ({} months) is shorter than the default period ({} months)",
                self.session.max_period_months, self.session.default_period_months
            )));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if let Some(team) = self.teams.iter().find(|t| t.tag.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "Team '{}' has an empty tag",
                team.name
            )));
        }

        Ok(())
    }

    pub fn hub_client_config(&self) -> HubClientConfig {
        HubClientConfig {
            base_url: self.stats_service.base_url.clone(),
            timeout: Duration::from_secs(self.stats_service.timeout_seconds),
            user_agent: self.stats_service.user_agent.clone(),
            ..HubClientConfig::default()
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            h2h_limit: self.stats_service.h2h_limit,
            form_limit: self.stats_service.form_limit,
            default_period_months: self.session.default_period_months,
            max_period_months: self.session.max_period_months,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio_test::assert_ok;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.log_level, "info");
        assert_eq!(config.stats_service.timeout_seconds, 15);
        assert_eq!(config.session.default_period_months, 3);
        assert_eq!(config.session.max_period_months, 24);
        assert_eq!(config.server.port, 8080);
        assert!(config.teams.is_empty());
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert_ok!(config.validate());
    }

    #[test]
    fn test_config_validation_bad_period() {
        let mut config = AppConfig::default();
        config.session.default_period_months = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_max_period_below_default() {
        let mut config = AppConfig::default();
        config.session.default_period_months = 6;
        config.session.max_period_months = 3;

        assert!(config.validate().is_err());

        config.session.max_period_months = 6;
        assert_ok!(config.validate());
        assert_eq!(config.session_settings().max_period_months, 6);
    }

    #[test]
    fn test_config_validation_bad_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = AppConfig::default();
        config.stats_service.base_url = "hub without scheme".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = AppConfig::default();
        config.teams.push(TeamInfo {
            tag: "FOO".to_string(),
            name: "Foo Fighters".to_string(),
            logo: Some("foo.png".to_string()),
        });
        let toml_str = toml::to_string(&config).unwrap();

        // Should be parseable
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.teams, config.teams);
        assert_eq!(parsed.stats_service.h2h_limit, Some(10));
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
log_level = "debug"

[stats_service]
base_url = "https://hub.example.org/api/v1"
form_limit = 5

[session]
default_period_months = 6

[[teams]]
tag = "FOO"
name = "Foo Fighters"

[[teams]]
tag = "BAR"
name = "Bar Room"
logo = "bar.png"
"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.teams.len(), 2);
        assert_eq!(config.teams[1].logo.as_deref(), Some("bar.png"));

        let settings = config.session_settings();
        assert_eq!(settings.form_limit, Some(5));
        assert_eq!(settings.h2h_limit, Some(10));
        assert_eq!(settings.default_period_months, 6);

        let hub = config.hub_client_config();
        assert_eq!(hub.base_url, "https://hub.example.org/api/v1");
        assert_eq!(hub.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 0").unwrap();

        assert!(matches!(
            AppConfig::from_file(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
