//! Configuration loading, validation, and management for SmartPick.
//!
//! Loads configuration from `~/.smartpick/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.smartpick/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Remote recommendation agent
    #[serde(default)]
    pub agent: AgentConfig,

    /// Stream pacing
    #[serde(default)]
    pub stream: StreamConfig,

    /// Fixed assistant replies used when the agent cannot answer
    #[serde(default)]
    pub replies: RepliesConfig,

    /// Card catalog source
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Carousel animation parameters
    #[serde(default)]
    pub carousel: CarouselConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Origin the chat UI is served from (CORS)
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

fn default_port() -> u16 {
    8787
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_allowed_origin() -> String {
    "http://localhost:3000".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allowed_origin: default_allowed_origin(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Base URL of the agent service; requests go to `{base_url}/agent/chat`
    #[serde(default = "default_agent_url")]
    pub base_url: String,

    /// Optional bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_agent_url() -> String {
    "http://localhost:8000".into()
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: default_agent_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Delay between stream frames; 0 delivers everything at once
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_interval_ms() -> u64 {
    16
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepliesConfig {
    /// Assistant reply when the agent call fails
    #[serde(default = "default_failure_reply")]
    pub failure: String,

    /// Assistant reply when the agent answers with blank text
    #[serde(default = "default_empty_reply")]
    pub empty: String,
}

fn default_failure_reply() -> String {
    "Sorry, something went wrong while contacting the agent.".into()
}
fn default_empty_reply() -> String {
    "죄송합니다. 조건에 맞는 카드를 찾지 못했습니다.".into()
}

impl Default for RepliesConfig {
    fn default() -> Self {
        Self {
            failure: default_failure_reply(),
            empty: default_empty_reply(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON catalog file; the built-in catalog is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarouselConfig {
    /// Seconds per full turn while spinning
    #[serde(default = "default_spin_period")]
    pub spin_period_secs: f64,
}

fn default_spin_period() -> f64 {
    2.0
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            spin_period_secs: default_spin_period(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location with env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        // Environment variable overrides (highest priority)
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply `SMARTPICK_*` overrides using the given variable lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SMARTPICK_AGENT_URL") {
            self.agent.base_url = url;
        }

        if self.agent.api_key.is_none() {
            self.agent.api_key = lookup("SMARTPICK_AGENT_API_KEY");
        }

        if let Some(host) = lookup("SMARTPICK_HOST") {
            self.gateway.host = host;
        }

        if let Some(port) = lookup("SMARTPICK_PORT") {
            self.gateway.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("SMARTPICK_PORT is not a valid port: {port}"))
            })?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".smartpick")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "agent.timeout_secs must be > 0".into(),
            ));
        }

        if self.agent.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "agent.base_url must not be empty".into(),
            ));
        }

        let spin = self.carousel.spin_period_secs;
        if spin.is_nan() || spin <= 0.0 {
            return Err(ConfigError::ValidationError(
                "carousel.spin_period_secs must be > 0".into(),
            ));
        }

        if self.replies.failure.trim().is_empty() || self.replies.empty.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "replies.failure and replies.empty must not be blank".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.gateway.port, 8787);
        assert_eq!(config.stream.interval_ms, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.agent.base_url, config.agent.base_url);
        assert_eq!(parsed.replies.empty, config.replies.empty);
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut config = AppConfig::default();
        config.agent.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_failure_reply_rejected() {
        let mut config = AppConfig::default();
        config.replies.failure = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.gateway.host, "127.0.0.1");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[agent]
base_url = "http://agent.internal:9000"

[stream]
interval_ms = 0

[catalog]
path = "/srv/cards.json"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.agent.base_url, "http://agent.internal:9000");
        assert_eq!(config.agent.timeout_secs, 120);
        assert_eq!(config.stream.interval_ms, 0);
        assert_eq!(config.catalog.path, Some(PathBuf::from("/srv/cards.json")));
        assert_eq!(config.gateway.port, 8787);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[gateway\nport = ").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("SMARTPICK_AGENT_URL", "http://override:1234"),
            ("SMARTPICK_PORT", "9999"),
            ("SMARTPICK_AGENT_API_KEY", "secret"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_env_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.agent.base_url, "http://override:1234");
        assert_eq!(config.gateway.port, 9999);
        assert_eq!(config.agent.api_key.as_deref(), Some("secret"));
        assert_eq!(config.gateway.host, "127.0.0.1");
    }

    #[test]
    fn invalid_port_override_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env_overrides(|k| {
            (k == "SMARTPICK_PORT").then(|| "not-a-port".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut config = AppConfig::default();
        config.agent.api_key = Some("super-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("8787"));
        assert!(toml_str.contains("localhost:8000"));
    }
}
