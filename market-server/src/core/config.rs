//! Server configuration
//!
//! All settings are resolved once at startup and passed by reference into
//! each component's constructor; nothing reads the environment after boot.
//!
//! # Environment variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | STORAGE_MODE | primary | `primary` (networked) or `fallback` (embedded) |
//! | DB_HOST | localhost | primary backend host |
//! | DB_PORT | 3306 | primary backend port |
//! | DB_USER | root | primary backend user |
//! | DB_PASSWORD | (empty) | primary backend password |
//! | DB_NAME | agri_market | primary backend database |
//! | SQLITE_PATH | agri_market.sqlite3 | fallback backend file |
//! | DB_TIMEOUT_SECS | 5 | pool acquire timeout |
//! | EXPIRY_POLL_MINUTES | 60 | expiry poller interval (floor 10s) |
//! | SMTP_HOST | smtp.gmail.com | mail transport host |
//! | SMTP_PORT | 587 | mail transport port |
//! | SMTP_USER | (unset) | mail transport user |
//! | SMTP_PASSWORD | (unset) | missing means "skip sending silently" |
//! | SMTP_FROM | SMTP_USER | from address |
//! | SMTP_TIMEOUT_SECS | 20 | per-delivery timeout |
//! | MEDIA_DIR | uploads | image file store directory |
//! | LOG_LEVEL | info | tracing level |
//! | LOG_DIR | (unset) | daily rolling log directory |

use std::time::Duration;

/// Which relational backend the storage adapter binds to. Resolved once;
/// the other backend is never used as a retry target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Networked relational database (MySQL).
    Primary,
    /// Embedded single-file database (SQLite).
    Fallback,
}

impl StorageMode {
    pub fn parse(s: &str) -> Option<StorageMode> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" | "mysql" => Some(StorageMode::Primary),
            "fallback" | "sqlite" => Some(StorageMode::Fallback),
            _ => None,
        }
    }
}

/// Storage connection parameters.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub mode: StorageMode,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub sqlite_path: String,
    /// Pool acquire timeout; storage calls never block unboundedly.
    pub timeout: Duration,
}

/// Mail transport parameters.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    /// `None` is a valid configuration meaning "skip sending silently".
    pub password: Option<String>,
    pub from: Option<String>,
    pub timeout: Duration,
}

/// Full server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub smtp: SmtpSettings,
    /// Requested expiry poller interval in minutes.
    pub expiry_poll_minutes: u64,
    pub media_dir: String,
    pub log_level: String,
    pub log_dir: Option<String>,
}

/// Minimum effective poller interval.
const POLL_FLOOR: Duration = Duration::from_secs(10);

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let mode = std::env::var("STORAGE_MODE")
            .ok()
            .and_then(|v| StorageMode::parse(&v))
            .unwrap_or(StorageMode::Primary);

        let smtp_user = std::env::var("SMTP_USER").ok().filter(|v| !v.is_empty());
        // Gmail app passwords are often pasted with spaces; strip them.
        let smtp_password = std::env::var("SMTP_PASSWORD")
            .ok()
            .map(|v| v.replace(' ', ""))
            .filter(|v| !v.is_empty());
        let smtp_from = std::env::var("SMTP_FROM")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| smtp_user.clone());

        Self {
            storage: StorageConfig {
                mode,
                host: env_or("DB_HOST", "localhost"),
                port: env_parse("DB_PORT", 3306),
                user: env_or("DB_USER", "root"),
                password: env_or("DB_PASSWORD", ""),
                database: env_or("DB_NAME", "agri_market"),
                sqlite_path: env_or("SQLITE_PATH", "agri_market.sqlite3"),
                timeout: Duration::from_secs(env_parse("DB_TIMEOUT_SECS", 5u64)),
            },
            smtp: SmtpSettings {
                host: env_or("SMTP_HOST", "smtp.gmail.com"),
                port: env_parse("SMTP_PORT", 587),
                user: smtp_user,
                password: smtp_password,
                from: smtp_from,
                timeout: Duration::from_secs(env_parse("SMTP_TIMEOUT_SECS", 20u64)),
            },
            expiry_poll_minutes: env_parse("EXPIRY_POLL_MINUTES", 60u64),
            media_dir: env_or("MEDIA_DIR", "uploads"),
            log_level: env_or("LOG_LEVEL", "info"),
            log_dir: std::env::var("LOG_DIR").ok().filter(|v| !v.is_empty()),
        }
    }

    /// Effective poller interval: the configured minutes clamped to the
    /// 10-second floor.
    pub fn expiry_poll_interval(&self) -> Duration {
        let requested = Duration::from_secs(self.expiry_poll_minutes * 60);
        requested.max(POLL_FLOOR)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_interval_clamps_to_floor() {
        let mut config = Config::from_env();
        config.expiry_poll_minutes = 0;
        assert_eq!(config.expiry_poll_interval(), Duration::from_secs(10));

        config.expiry_poll_minutes = 60;
        assert_eq!(config.expiry_poll_interval(), Duration::from_secs(3600));
    }

    #[test]
    fn storage_mode_parsing() {
        assert_eq!(StorageMode::parse("primary"), Some(StorageMode::Primary));
        assert_eq!(StorageMode::parse("FALLBACK"), Some(StorageMode::Fallback));
        assert_eq!(StorageMode::parse("bogus"), None);
    }
}
