//! Configuration management for the rental server

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::{collections::HashMap, env};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: u64,
    /// Argon2 PHC string for the operations department password
    pub admin_password_hash: Option<String>,
    /// Plaintext fallback, hashed once at startup when no hash is configured
    pub admin_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
    /// When set, logs are also written to a daily rolling file in this directory
    pub directory: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmailConfig {
    /// Without this flag every delivery is a dry run
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub smtp_from_name: Option<String>,
    /// TLS from the first byte (port 465 style); takes precedence over STARTTLS
    pub smtp_implicit_tls: bool,
    pub smtp_use_tls: bool,
    /// Directory holding the emails_YYYY-MM-DD.json delivery logs
    pub log_dir: String,
    /// Prefix shown in subjects and footers
    pub brand: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApprovalsConfig {
    pub hardware_queue: String,
    pub consumable_queue: String,
    /// Queue id -> mailbox notified about new requests
    pub queue_emails: HashMap<String, String>,
}

/// How rentals of consumable items interact with each other
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConsumablePolicy {
    /// Any number of open rentals; the item stays available
    Concurrent,
    /// Same rules as hardware: one open rental, status follows it
    Exclusive,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RentalsConfig {
    pub consumable_policy: ConsumablePolicy,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Default window for return reminders, in days
    pub reminder_days: i64,
    pub scan_enabled: bool,
    pub scan_interval_minutes: u64,
    pub outbox_capacity: usize,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UsersConfig {
    /// Domain used to build an address when a user logs in without one
    pub email_domain: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    pub email: EmailConfig,
    pub approvals: ApprovalsConfig,
    pub rentals: RentalsConfig,
    pub notifications: NotificationsConfig,
    pub users: UsersConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // RENTAL__EMAIL__SMTP_HOST style overrides
            .add_source(
                Environment::with_prefix("RENTAL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            // Historical SMTP variables
            .set_override_option("email.enabled", env::var("EMAIL_ENABLED").ok())?
            .set_override_option("email.smtp_host", env::var("SMTP_HOST").ok())?
            .set_override_option("email.smtp_port", env::var("SMTP_PORT").ok())?
            .set_override_option("email.smtp_username", env::var("SMTP_USER").ok())?
            .set_override_option("email.smtp_password", env::var("SMTP_PASSWORD").ok())?
            .set_override_option("email.smtp_from", env::var("EMAIL_FROM").ok())?
            .set_override_option("auth.jwt_secret", env::var("JWT_SECRET").ok())?
            .set_override_option("auth.admin_password", env::var("ADMIN_PASSWORD").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-this-secret-in-production".to_string(),
            jwt_expiration_hours: 12,
            admin_password_hash: None,
            admin_password: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            directory: None,
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 465,
            smtp_username: None,
            smtp_password: None,
            smtp_from: "noreply@example.com".to_string(),
            smtp_from_name: Some("Gear Rental".to_string()),
            smtp_implicit_tls: true,
            smtp_use_tls: true,
            log_dir: "logs".to_string(),
            brand: "Gear Rental".to_string(),
        }
    }
}

impl Default for ApprovalsConfig {
    fn default() -> Self {
        Self {
            hardware_queue: "tech-manager".to_string(),
            consumable_queue: "product-team-manager".to_string(),
            queue_emails: HashMap::new(),
        }
    }
}

impl Default for RentalsConfig {
    fn default() -> Self {
        Self {
            consumable_policy: ConsumablePolicy::Concurrent,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            reminder_days: 3,
            scan_enabled: false,
            scan_interval_minutes: 60,
            outbox_capacity: 256,
            max_attempts: 4,
            initial_backoff_ms: 2_000,
            max_backoff_ms: 60_000,
        }
    }
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            email_domain: "example.com".to_string(),
        }
    }
}

impl RentalsConfig {
    /// Whether rentals of this category are exclusive and drive the item status
    pub fn is_exclusive(&self, category: crate::models::Category) -> bool {
        !category.is_consumable() || self.consumable_policy == ConsumablePolicy::Exclusive
    }
}
