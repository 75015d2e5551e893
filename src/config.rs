use std::env;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    // Logging
    pub log_dir: String,
    pub log_level: String,

    // Attachments
    pub attachment_dir: String,
    pub attachment_base_url: String,
    pub attachment_max_bytes: u64,
    pub attachment_types: Vec<String>,

    // Notification queue
    pub notification_queue_capacity: usize,
    pub notification_max_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: optional("API_PREFIX", "/api".to_string())?,

            rate_protected_per_min: optional("RATE_PROTECTED_PER_MIN", 1000)?,

            log_dir: optional("LOG_DIR", "logs".to_string())?,
            log_level: optional("LOG_LEVEL", "info".to_string())?,

            attachment_dir: optional("ATTACHMENT_DIR", "uploads".to_string())?,
            attachment_base_url: optional("ATTACHMENT_BASE_URL", "/files".to_string())?,
            attachment_max_bytes: optional("ATTACHMENT_MAX_BYTES", 5 * 1024 * 1024)?,
            attachment_types: optional(
                "ATTACHMENT_TYPES",
                "application/pdf,image/jpeg,image/png".to_string(),
            )?
            .split(',')
            .map(|kind| kind.trim().to_string())
            .filter(|kind| !kind.is_empty())
            .collect(),

            notification_queue_capacity: optional("NOTIFICATION_QUEUE_CAPACITY", 256)?,
            notification_max_attempts: optional("NOTIFICATION_MAX_ATTEMPTS", 3)?,
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn optional<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}
