//! Config - Application Configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_EVENT, DEFAULT_TOPIC, RETRY_INITIAL_DELAY_MS, RETRY_JITTER, RETRY_MAX_DELAY_MS,
    RETRY_MULTIPLIER,
};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Pub/sub server
    pub server: ServerConfig,
    /// Topic subscription
    pub channel: ChannelConfig,
    /// HTML output
    pub render: RenderConfig,
    /// Log output
    pub log: LogConfig,
    /// Connect retry policy
    pub retry: RetrySettings,
}

/// Pub/sub server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Password (encrypted storage)
    pub password: Option<String>,
    /// Connection timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    /// Password to authenticate with; an empty string counts as none
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|pwd| !pwd.is_empty())
    }

    /// Generate display name without credentials (e.g., "127.0.0.1:6379")
    pub fn display_name(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Topic and event names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChannelConfig {
    pub topic: String,
    pub event: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            event: DEFAULT_EVENT.to_string(),
        }
    }
}

/// HTML rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Snapshot page path; `~/` is expanded. No snapshot when unset.
    pub output: Option<PathBuf>,
    /// Page title
    pub title: String,
    /// Emit the historical `sucess` class instead of `success`
    pub legacy_success_class: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output: None,
            title: "Checks".to_string(),
            legacy_success_class: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Default level when `RUST_LOG` is unset
    pub level: String,
    /// Directory for daily rolling log files
    pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

/// Connect retry settings as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrySettings {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
    pub jitter: f64,
    /// Maximum number of connect attempts (0 = unlimited)
    pub max_attempts: u32,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            initial_delay_ms: RETRY_INITIAL_DELAY_MS,
            max_delay_ms: RETRY_MAX_DELAY_MS,
            multiplier: RETRY_MULTIPLIER,
            jitter: RETRY_JITTER,
            max_attempts: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_and_display_name() {
        let mut server = ServerConfig::default();
        assert_eq!(server.password(), None);

        server.password = Some("s3cret".to_string());
        assert_eq!(server.password(), Some("s3cret"));
        assert_eq!(server.display_name(), "127.0.0.1:6379");

        server.password = Some(String::new());
        assert_eq!(server.password(), None);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            host = "checks.internal"

            [render]
            legacy_success_class = true
            "#,
        )
        .expect("parse");

        assert_eq!(config.server.host, "checks.internal");
        assert_eq!(config.server.port, 6379);
        assert_eq!(config.channel.topic, "checks:all");
        assert_eq!(config.channel.event, "event");
        assert!(config.render.legacy_success_class);
        assert_eq!(config.retry.max_attempts, 0);
    }
}
