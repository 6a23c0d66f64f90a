use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use content_hub_core::media::rules::max_upload_size;

/// Headroom on top of the largest file for multipart boundaries and fields.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Maximum database connections in the pool.
    pub db_max_connections: u32,
    /// Minimum database connections in the pool.
    pub db_min_connections: u32,
    /// Shared HS256 secret used to verify tokens from the Auth service.
    pub jwt_secret: String,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
    /// Root directory for uploaded files.
    pub upload_dir: PathBuf,
    /// Public base URL used to build media URLs.
    pub base_url: String,
    /// Largest request body accepted on upload routes.
    pub max_upload_bytes: usize,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
}

fn var_or(name: &'static str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn list_var(name: &'static str) -> Vec<String> {
    env::var(name)
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty() && *v != "*")
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: var_or("HOST", "0.0.0.0"),
            port: parse_var("PORT", 3030)?,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 20)?,
            db_min_connections: parse_var("DB_MIN_CONNECTIONS", 5)?,
            jwt_secret: var_or("JWT_SECRET", "dev-secret-change-me-in-production"),
            log_level: var_or("LOG_LEVEL", "info"),
            upload_dir: PathBuf::from(var_or("UPLOAD_DIR", "./storage")),
            base_url: var_or("BASE_URL", "http://localhost:3030"),
            max_upload_bytes: parse_var(
                "MAX_UPLOAD_BYTES",
                max_upload_size() as usize + MULTIPART_OVERHEAD,
            )?,
            cors_origins: list_var("CORS_ORIGINS"),
        })
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[cfg(test)]
    pub fn for_tests(upload_dir: PathBuf, jwt_secret: &str) -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            database_url: String::new(),
            db_max_connections: 1,
            db_min_connections: 0,
            jwt_secret: jwt_secret.into(),
            log_level: "debug".into(),
            upload_dir,
            base_url: "http://localhost:3030".into(),
            max_upload_bytes: max_upload_size() as usize + MULTIPART_OVERHEAD,
            cors_origins: Vec::new(),
        }
    }
}
