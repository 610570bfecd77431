//! Configuration management
//!
//! This module handles loading, validation, and management of the rxassist
//! configuration. Configuration is stored in TOML format at
//! ~/.rxassist/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, download directory
//! - **backend**: Base URL and timeouts of the request/response backend
//! - **live**: Live chat channel URL and reconnect behaviour
//! - **workflow**: Welcome message and failure announcements
//!
//! Every section and field has a default, so a partial file is valid.
//!
//! # Path Expansion
//!
//! `~` in `core.download_dir` is expanded to the user's home directory. The
//! directory itself is created on first download, not at load time.
//!
//! # Examples
//!
//! ```no_run
//! use rxassist_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//!
//! println!("Backend: {}", config.backend.base_url);
//! println!("Downloads: {:?}", config.core.download_dir);
//! # Ok(())
//! # }
//! ```

use rxassist_sdk::AssistantError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Accepted values of `core.log_level`
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub core: CoreConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub live: LiveConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,
}

/// Core settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Where downloaded prescriptions are written (supports ~ expansion)
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            download_dir: default_download_dir(),
        }
    }
}

/// Request/response backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL the upload, update, generation and download paths hang off
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout. Generation can take minutes.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Live chat channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveConfig {
    /// Open the live channel when a chat session starts
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// WebSocket URL
    #[serde(default = "default_live_url")]
    pub url: String,

    /// Reconnect after the connection drops
    #[serde(default = "default_true")]
    pub reconnect: bool,

    /// Delay in seconds before reconnecting after disconnect
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_live_url(),
            reconnect: true,
            reconnect_delay_secs: default_reconnect_delay(),
        }
    }
}

/// Conversation behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Greeting appended shortly after a session opens. Empty disables it.
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,

    #[serde(default = "default_welcome_delay")]
    pub welcome_delay_secs: u64,

    /// Append the error hint to the transcript when a call fails
    #[serde(default)]
    pub announce_failures: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            welcome_message: default_welcome_message(),
            welcome_delay_secs: default_welcome_delay(),
            announce_failures: false,
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("~/.rxassist/downloads")
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> u64 {
    300
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_live_url() -> String {
    "ws://localhost:8000/ws".to_string()
}

fn default_reconnect_delay() -> u64 {
    5
}

fn default_welcome_message() -> String {
    "HELLO WELCOME !!!".to_string()
}

fn default_welcome_delay() -> u64 {
    5
}

impl Config {
    /// Load configuration from the default location (~/.rxassist/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or written
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, AssistantError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, AssistantError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| AssistantError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&contents)
    }

    /// Parse and validate configuration text
    pub fn from_toml(contents: &str) -> Result<Self, AssistantError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| AssistantError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Write the default configuration to `path` and return it processed
    pub fn create_default(path: &Path) -> Result<Self, AssistantError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AssistantError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        // Serialized before processing so the file keeps `~` paths
        let mut config = Self::default();
        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| AssistantError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| AssistantError::Config(format!("Failed to write config file: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.rxassist/config.toml)
    pub fn default_config_path() -> Result<PathBuf, AssistantError> {
        let home = dirs::home_dir().ok_or_else(|| {
            AssistantError::Config("Could not determine home directory".to_string())
        })?;

        Ok(home.join(".rxassist").join("config.toml"))
    }

    /// Validate values and expand paths
    fn validate_and_process(&mut self) -> Result<(), AssistantError> {
        if !LOG_LEVELS.contains(&self.core.log_level.as_str()) {
            return Err(AssistantError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        if !(self.backend.base_url.starts_with("http://")
            || self.backend.base_url.starts_with("https://"))
        {
            return Err(AssistantError::Config(format!(
                "backend.base_url must start with http:// or https://, got '{}'",
                self.backend.base_url
            )));
        }
        self.backend.base_url = self.backend.base_url.trim_end_matches('/').to_string();

        if self.backend.request_timeout_secs == 0 || self.backend.connect_timeout_secs == 0 {
            return Err(AssistantError::Config(
                "backend timeouts must be greater than 0".to_string(),
            ));
        }

        if !(self.live.url.starts_with("ws://") || self.live.url.starts_with("wss://")) {
            return Err(AssistantError::Config(format!(
                "live.url must start with ws:// or wss://, got '{}'",
                self.live.url
            )));
        }

        self.core.download_dir = expand_path(&self.core.download_dir)?;

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
pub fn expand_path(path: &Path) -> Result<PathBuf, AssistantError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| AssistantError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or_else(|| {
            AssistantError::Config("Could not determine home directory".to_string())
        })?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| AssistantError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}
