//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `TRIAGE_*` environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub push: PushConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub notifications: NotificationsConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Triage backend connection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub url: String,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Push channel subscription
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PushConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_push_url")]
    pub url: String,

    /// Reconnect attempts after the channel drops (0 = never reconnect)
    #[serde(default)]
    pub max_reconnect_attempts: u32,
}

fn default_push_url() -> String {
    "ws://localhost:8000/ws/vitals".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_push_url(),
            max_reconnect_attempts: 0,
        }
    }
}

/// Queue view and history sizing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_page_size() -> usize {
    crate::queue::DEFAULT_PAGE_SIZE
}

fn default_history_capacity() -> usize {
    crate::queue::DEFAULT_HISTORY_CAPACITY
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            history_capacity: default_history_capacity(),
        }
    }
}

/// Notification lifetimes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_arrival_ttl")]
    pub arrival_ttl_ms: u64,

    #[serde(default = "default_critical_ttl")]
    pub critical_ttl_ms: u64,
}

fn default_arrival_ttl() -> u64 {
    crate::notify::DEFAULT_ARRIVAL_TTL_MS
}

fn default_critical_ttl() -> u64 {
    crate::notify::DEFAULT_CRITICAL_TTL_MS
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            arrival_ttl_ms: default_arrival_ttl(),
            critical_ttl_ms: default_critical_ttl(),
        }
    }
}

/// Simulated arrivals
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_simulation_interval")]
    pub interval_ms: u64,
}

fn default_simulation_interval() -> u64 {
    5_000
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: default_simulation_interval(),
        }
    }
}

/// Who is looking at the dashboard
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Logged-in doctor's name; unset means an admin/overview session
    #[serde(default)]
    pub doctor: Option<String>,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_request_timeout() -> u64 {
    30
}

impl ApiConfig {
    /// Socket address string the local API binds to
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("triage-live").join("config.toml")),
            Some(PathBuf::from("/etc/triage-live/config.toml")),
            Some(PathBuf::from("./triage-live.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `TRIAGE_*` overrides from any key/value source
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Backend overrides
        if let Some(url) = lookup("TRIAGE_BACKEND_URL") {
            self.backend.url = url;
        }
        if let Some(url) = lookup("TRIAGE_PUSH_URL") {
            self.push.url = url;
        }

        // Session overrides
        if let Some(doctor) = lookup("TRIAGE_DOCTOR") {
            self.session.doctor = if doctor.trim().is_empty() {
                None
            } else {
                Some(doctor)
            };
        }
        if let Some(enabled) = lookup("TRIAGE_SIMULATION") {
            if let Ok(v) = enabled.parse() {
                self.simulation.enabled = v;
            }
        }

        // API overrides
        if let Some(host) = lookup("TRIAGE_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("TRIAGE_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Logging overrides
        if let Some(level) = lookup("TRIAGE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("TRIAGE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Triage Live Configuration
#
# Environment variables override these settings:
# - TRIAGE_BACKEND_URL
# - TRIAGE_PUSH_URL
# - TRIAGE_DOCTOR
# - TRIAGE_SIMULATION
# - TRIAGE_API_HOST
# - TRIAGE_API_PORT
# - TRIAGE_LOG_LEVEL
# - TRIAGE_LOG_FORMAT

[backend]
# Triage backend base URL
url = "http://localhost:8000"

# Request timeout (ms)
request_timeout_ms = 10000

[push]
# Subscribe to full-queue snapshots
enabled = true
url = "ws://localhost:8000/ws/vitals"

# Reconnect attempts after the channel drops (0 = never)
max_reconnect_attempts = 0

[queue]
# Records per page
page_size = 9

# Vitals samples kept per patient
history_capacity = 20

[notifications]
arrival_ttl_ms = 5000
critical_ttl_ms = 8000

[simulation]
# Periodically ask the backend for a simulated arrival
enabled = false
interval_ms = 5000

[session]
# Logged-in doctor; leave unset for the admin overview
# doctor = "Dr. Heart"

[api]
# Local view API
host = "0.0.0.0"
port = 8090

# Request timeout in seconds
request_timeout_secs = 30

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
