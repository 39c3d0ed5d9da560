//! BreadDuty configuration system.
//!
//! One explicit configuration object, loaded once at startup and passed to
//! the store, mailer, scheduler, and gateway. No hidden process-wide state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BreadDutyConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl BreadDutyConfig {
    /// Load config from the default path (~/.breadduty/config.toml), or the
    /// path in `BREADDUTY_CONFIG` when set. Missing file means defaults.
    pub fn load() -> Result<Self> {
        let path = std::env::var("BREADDUTY_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the BreadDuty home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".breadduty")
    }
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// SMTP transport configuration — fixed per process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub from_email: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// "tls" (implicit TLS), "starttls", or "none".
    #[serde(default = "default_tls_mode")]
    pub tls: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_smtp_port() -> u16 {
    587
}
fn default_from_name() -> String {
    "Bread Duty".into()
}
fn default_tls_mode() -> String {
    "tls".into()
}
fn default_timeout() -> u64 {
    30
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from_email: String::new(),
            from_name: default_from_name(),
            tls: default_tls_mode(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Scheduled-job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Lookahead window, in days, for the daily reminder pass.
    #[serde(default = "default_lookahead")]
    pub reminder_lookahead_days: i64,
    /// Period of the daily jobs (reminders + purge), in seconds.
    #[serde(default = "default_daily_secs")]
    pub daily_interval_secs: u64,
    /// Local time of the Tuesday/Thursday day-of broadcast.
    #[serde(default = "default_broadcast_hour")]
    pub broadcast_hour: u32,
    #[serde(default = "default_broadcast_minute")]
    pub broadcast_minute: u32,
}

fn default_lookahead() -> i64 {
    1
}
fn default_daily_secs() -> u64 {
    60 * 60 * 24
}
fn default_broadcast_hour() -> u32 {
    9
}
fn default_broadcast_minute() -> u32 {
    15
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reminder_lookahead_days: default_lookahead(),
            daily_interval_secs: default_daily_secs(),
            broadcast_hour: default_broadcast_hour(),
            broadcast_minute: default_broadcast_minute(),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path. Tilde is expanded by the binary at startup.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "~/.breadduty/breadduty.db".into()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}
