//! TOML-based configuration for Courier
//!
//! Everything is read from `courier.toml`. Every section has defaults, so an
//! empty file (or `CourierConfig::default()`) yields a runnable relay that
//! only lacks a real webhook URL.
//!
//! # Hot Reloading
//!
//! `ConfigManager` keeps the current configuration behind an `ArcSwap`, so
//! handlers read it lock-free and a file watcher can replace it at runtime.
//! The webhook URL, timeout, reply fields and fallback texts all take effect
//! on the next request.

use crate::memory::DEFAULT_HISTORY_LIMIT;
use crate::relay::fallback::default_apologies;
use crate::relay::reply::{DEFAULT_GENERIC_REPLY, DEFAULT_REPLY_FIELDS};
use arc_swap::ArcSwap;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Environment variable that overrides `webhook.url`.
pub const WEBHOOK_URL_ENV: &str = "COURIER_WEBHOOK_URL";

/// Root configuration structure loaded from courier.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourierConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub webhook: WebhookConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub fallback: FallbackConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log line format: human-readable text or one JSON object per line
    #[serde(default)]
    pub log_format: LogFormat,

    /// Directory holding the chat UI, served at `/`
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Name reported by the health endpoint
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_service_name() -> String {
    "Engineering Admission Chatbot API".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            static_dir: default_static_dir(),
            service_name: default_service_name(),
        }
    }
}

// ============= Webhook Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default = "default_webhook_url")]
    pub url: String,

    #[serde(default = "default_webhook_timeout")]
    pub timeout_secs: u64,

    /// Keys checked, in order, for the reply text in an object response
    #[serde(default = "default_reply_fields")]
    pub reply_fields: Vec<String>,
}

fn default_webhook_url() -> String {
    "http://localhost:5678/webhook/chat".to_string()
}

fn default_webhook_timeout() -> u64 {
    100
}

fn default_reply_fields() -> Vec<String> {
    DEFAULT_REPLY_FIELDS.iter().map(|f| f.to_string()).collect()
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: default_webhook_url(),
            timeout_secs: default_webhook_timeout(),
            reply_fields: default_reply_fields(),
        }
    }
}

// ============= Session Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default = "default_session_id")]
    pub default_session_id: String,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_session_id() -> String {
    "default".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            default_session_id: default_session_id(),
        }
    }
}

// ============= Fallback Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Used when the webhook answered without any usable text
    #[serde(default = "default_generic_reply")]
    pub generic_reply: String,

    /// One of these is returned when the webhook could not be reached
    #[serde(default = "default_apologies")]
    pub apologies: Vec<String>,
}

fn default_generic_reply() -> String {
    DEFAULT_GENERIC_REPLY.to_string()
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            generic_reply: default_generic_reply(),
            apologies: default_apologies(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),
}

impl CourierConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: CourierConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.webhook_url();
        match reqwest::Url::parse(&url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                return Err(ConfigError::ValidationError(format!(
                    "webhook url must be http or https, got scheme '{}'",
                    parsed.scheme()
                )));
            }
            Err(e) => {
                return Err(ConfigError::ValidationError(format!(
                    "invalid webhook url '{}': {}",
                    url, e
                )));
            }
        }

        if self.webhook.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "webhook.timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.webhook.reply_fields.is_empty() {
            return Err(ConfigError::ValidationError(
                "webhook.reply_fields must list at least one key".to_string(),
            ));
        }

        if self.session.history_limit == 0 {
            return Err(ConfigError::ValidationError(
                "session.history_limit must be greater than zero".to_string(),
            ));
        }

        if self.session.default_session_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "session.default_session_id must not be empty".to_string(),
            ));
        }

        if self.fallback.apologies.is_empty() {
            return Err(ConfigError::ValidationError(
                "fallback.apologies must contain at least one reply".to_string(),
            ));
        }

        Ok(())
    }

    /// Webhook URL, preferring the `COURIER_WEBHOOK_URL` environment variable
    pub fn webhook_url(&self) -> String {
        std::env::var(WEBHOOK_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.webhook.url.clone())
    }

    /// Socket address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Render the configuration back to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ValidationError(format!("cannot serialize config: {}", e)))
    }
}

// ============= Hot Reloading Configuration Manager =============

/// Thread-safe configuration manager with hot reloading support
pub struct ConfigManager {
    config: Arc<ArcSwap<CourierConfig>>,
    config_path: PathBuf,
    watcher: RwLock<Option<RecommendedWatcher>>,
}

impl ConfigManager {
    /// Create a new configuration manager and load the initial config
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        // Convert to absolute path for reliable file watching
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = CourierConfig::load(&path)?;

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: path,
            watcher: RwLock::new(None),
        })
    }

    /// Create a config manager directly from a config (no file watching)
    pub fn from_config(config: CourierConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: PathBuf::from("courier.toml"),
            watcher: RwLock::new(None),
        }
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<CourierConfig> {
        self.config.load_full()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Manually reload the configuration from disk
    pub fn reload(&self) -> Result<(), ConfigError> {
        info!("Reloading configuration from {:?}", self.config_path);

        let new_config = CourierConfig::load(&self.config_path)?;
        self.config.store(Arc::new(new_config));

        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Start watching for configuration file changes
    pub fn start_watching(&self) -> Result<(), ConfigError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let config_path = self.config_path.clone();
        let config_arc = Arc::clone(&self.config);
        let file_name = self.config_path.file_name().map(|n| n.to_os_string());

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if touches_config && (event.kind.is_modify() || event.kind.is_create()) {
                        let _ = tx.send(());
                    }
                }
                Err(e) => {
                    error!("Config watcher error: {:?}", e);
                }
            }
        })?;

        // Watch the parent directory so editors that replace the file are seen
        if let Some(parent) = self.config_path.parent() {
            watcher.watch(parent, RecursiveMode::NonRecursive)?;
        }

        *self.watcher.write() = Some(watcher);

        tokio::spawn(async move {
            let debounce_duration = Duration::from_millis(500);
            let mut last_reload: Option<std::time::Instant> = None;

            while rx.recv().await.is_some() {
                if last_reload.is_some_and(|at| at.elapsed() < debounce_duration) {
                    continue;
                }

                // Wait a bit for the write to complete
                tokio::time::sleep(Duration::from_millis(100)).await;

                match CourierConfig::load(&config_path) {
                    Ok(new_config) => {
                        config_arc.store(Arc::new(new_config));
                        info!("Configuration hot-reloaded successfully");
                        last_reload = Some(std::time::Instant::now());
                    }
                    Err(e) => {
                        warn!(
                            "Failed to hot-reload config: {}. Keeping previous config.",
                            e
                        );
                    }
                }
            }
        });

        info!("Configuration hot-reload watcher started");
        Ok(())
    }

    /// Stop watching for configuration changes
    pub fn stop_watching(&self) {
        *self.watcher.write() = None;
        info!("Configuration hot-reload watcher stopped");
    }
}
