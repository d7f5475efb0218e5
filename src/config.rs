//! Configuration module
//!
//! Loads a TOML file (default `~/.config/hotel-booking/config.toml`),
//! falling back to built-in defaults when the file is absent. A few
//! deployment-sensitive values can be overridden via environment
//! variables: `DATABASE_URL`, `JWT_SECRET`, `WEBHOOK_SECRET`.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Default config file path: `~/.config/hotel-booking/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hotel-booking")
        .join("config.toml")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "sqlite://./hotel.db?mode=rwc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    /// Shared secret for settlement webhook signatures
    pub webhook_secret: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "super-secret-key-change-in-production".to_string(),
            jwt_expiration_hours: 24,
            webhook_secret: "webhook-secret-change-in-production".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaymentsConfig {
    /// Hours a Pending payment waits for settlement before it expires
    pub expiry_hours: i64,
    /// Base URL checkout session URLs are minted under
    pub checkout_base_url: String,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            expiry_hours: 24,
            checkout_base_url: "http://localhost:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SweepsConfig {
    /// Seconds between no-show sweep passes
    pub no_show_interval_secs: u64,
    /// Seconds between payment expiry passes
    pub payment_expiry_interval_secs: u64,
}

impl Default for SweepsConfig {
    fn default() -> Self {
        Self {
            no_show_interval_secs: 3600,
            payment_expiry_interval_secs: 600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Default staff account created on first start when no users exist
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: "admin@hotel.local".to_string(),
            password: "admin123".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub security: SecurityConfig,
    pub payments: PaymentsConfig,
    pub sweeps: SweepsConfig,
    pub logging: LoggingConfig,
    pub admin: AdminConfig,
}

impl AppConfig {
    /// Load from a TOML file and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: AppConfig = toml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.security.jwt_secret = secret;
        }
        if let Ok(secret) = std::env::var("WEBHOOK_SECRET") {
            self.security.webhook_secret = secret;
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────
