//! Service configuration.
//!
//! Values come from an optional TOML file, then environment variables
//! (`DATABASE_URL`, `AI_SERVICE_URL`, `PLATFORM_BACKEND_URL`, `BIND_HOST`,
//! `PORT`), then command-line flags.

use std::path::Path;
use std::time::Duration;

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tictactoe_engine::AiDifficulty;
use tracing::{debug, info, instrument};

/// Configuration for the game service.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// SQLite database path.
    #[serde(default = "default_database_url")]
    database_url: String,
    /// Interface to bind.
    #[serde(default = "default_host")]
    host: String,
    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,
    /// Remote AI service; the local random chooser is used when absent.
    #[serde(default)]
    ai_service_url: Option<String>,
    /// Platform backend; notifications are disabled when absent.
    #[serde(default)]
    platform_url: Option<String>,
    /// Difficulty for PvAI games that do not choose one.
    #[serde(default)]
    default_ai_difficulty: AiDifficulty,
    /// Timeout for outbound HTTP calls.
    #[serde(default = "default_http_timeout_secs")]
    http_timeout_secs: u64,
}

fn default_database_url() -> String {
    "tictactoe.db".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_http_timeout_secs() -> u64 {
    5
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            host: default_host(),
            port: default_port(),
            ai_service_url: None,
            platform_url: None,
            default_ai_difficulty: AiDifficulty::default(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl ServiceConfig {
    /// Loads configuration from TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");

        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text; missing keys take defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        info!(database_url = %config.database_url, "Config loaded successfully");
        Ok(config)
    }

    /// File (if any) plus process environment.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies environment-style overrides from `lookup`.
    ///
    /// Empty values clear the optional URLs.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(url) = lookup("AI_SERVICE_URL") {
            self.ai_service_url = non_empty(url);
        }
        if let Some(url) = lookup("PLATFORM_BACKEND_URL") {
            self.platform_url = non_empty(url);
        }
        if let Some(host) = lookup("BIND_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|e| ConfigError::new(format!("Invalid PORT '{}': {}", port, e)))?;
        }
        debug!(config = ?self, "Overrides applied");
        Ok(())
    }

    /// Replaces host and port with command-line values when given.
    pub fn with_bind(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Outbound HTTP timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.database_url(), "tictactoe.db");
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(*config.default_ai_difficulty(), AiDifficulty::Medium);
        assert_eq!(config.http_timeout(), Duration::from_secs(5));
        assert!(config.ai_service_url().is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ServiceConfig::from_toml(
            r#"
            port = 8080
            default_ai_difficulty = "hard"
            platform_url = "http://platform.local"
            "#,
        )
        .unwrap();

        assert_eq!(*config.port(), 8080);
        assert_eq!(*config.default_ai_difficulty(), AiDifficulty::Hard);
        assert_eq!(config.platform_url().as_deref(), Some("http://platform.local"));
        assert_eq!(config.host(), "127.0.0.1");
    }

    #[test]
    fn test_invalid_toml_errors() {
        assert!(ServiceConfig::from_toml("port = \"not a number\"").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "/tmp/games.db"),
            ("AI_SERVICE_URL", "http://ai.local"),
            ("PLATFORM_BACKEND_URL", " "),
            ("PORT", "9000"),
        ]);
        let mut config = ServiceConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database_url(), "/tmp/games.db");
        assert_eq!(config.ai_service_url().as_deref(), Some("http://ai.local"));
        assert!(config.platform_url().is_none());
        assert_eq!(*config.port(), 9000);
    }

    #[test]
    fn test_bad_port_override() {
        let mut config = ServiceConfig::default();
        let result = config.apply_overrides(|key| (key == "PORT").then(|| "http".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_bind_wins() {
        let config = ServiceConfig::default().with_bind(Some("0.0.0.0".to_string()), None);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }
}
