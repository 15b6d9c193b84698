//! Service configuration.
//!
//! Values come from environment variables (optionally seeded from a `.env`
//! file by [`crate::bootstrap::init_env`]) with defaults for everything
//! except the database location.

use std::{path::PathBuf, str::FromStr};

use bigdecimal::{BigDecimal, Zero};
use thiserror::Error;

pub const DEFAULT_TAX_RATE: &str = "0.05";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    /// Rate applied to an invoice total to obtain its tax amount.
    pub tax_rate: BigDecimal,
    /// Root directory for uploaded item images.
    pub upload_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

/// Loads configuration from the process environment.
pub fn load() -> Result<AppConfig, ConfigError> {
    from_lookup(|key| std::env::var(key).ok())
}

/// Builds configuration from an arbitrary key lookup.
///
/// `DATABASE_URL` wins when present. Otherwise a `key=value` connection
/// string is assembled from `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASS` and
/// `DB_NAME`.
pub fn from_lookup<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let server = ServerConfig {
        host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
        port: parse_or("SERVER_PORT", lookup("SERVER_PORT"), 8080)?,
    };

    let url = match lookup("DATABASE_URL") {
        Some(url) => url,
        None => database_url_from_parts(&lookup)?,
    };

    let database = DatabaseConfig {
        url,
        max_connections: parse_or("DB_MAX_CONNECTIONS", lookup("DB_MAX_CONNECTIONS"), 10)?,
    };

    let tax_rate = match lookup("TAX_RATE") {
        Some(raw) => BigDecimal::from_str(raw.trim())
            .map_err(|_| ConfigError::InvalidValue("TAX_RATE".to_string()))?,
        None => BigDecimal::from_str(DEFAULT_TAX_RATE)
            .map_err(|_| ConfigError::InvalidValue("TAX_RATE".to_string()))?,
    };
    if tax_rate < BigDecimal::zero() {
        return Err(ConfigError::InvalidValue("TAX_RATE".to_string()));
    }

    let upload_dir = PathBuf::from(
        lookup("UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string()),
    );

    Ok(AppConfig {
        server,
        database,
        tax_rate,
        upload_dir,
    })
}

fn database_url_from_parts<F>(lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let require = |key: &str| lookup(key).ok_or_else(|| ConfigError::MissingRequired(key.into()));

    let host = lookup("DB_HOST")
        .ok_or_else(|| ConfigError::MissingRequired("DATABASE_URL or DB_HOST".into()))?;
    let port: u16 = parse_or("DB_PORT", lookup("DB_PORT"), 5432)?;
    let user = require("DB_USER")?;
    let password = lookup("DB_PASS").unwrap_or_default();
    let name = require("DB_NAME")?;

    let mut params = vec![
        format!("host={}", quote_param(&host)),
        format!("port={}", port),
        format!("user={}", quote_param(&user)),
    ];
    if !password.is_empty() {
        params.push(format!("password={}", quote_param(&password)));
    }
    params.push(format!("dbname={}", quote_param(&name)));

    Ok(params.join(" "))
}

/// Single-quotes a connection string value, escaping `\` and `'`.
fn quote_param(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}
