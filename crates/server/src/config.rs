use database::services::expiration::DEFAULT_EXPIRATION_DAYS;
use std::{env, str::FromStr, time::Duration};
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_LMS_ROOT_URL: &str = "http://localhost:18000";
const DEFAULT_EXPIRATION_INTERVAL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Server settings read from the environment
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    /// JWTs are only validated when an issuer is configured
    pub oidc_issuer_url: Option<String>,
    pub lms_root_url: String,
    pub enable_enrollment_reset: bool,
    pub expiration_days: i64,
    pub expiration_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            database_url,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            oidc_issuer_url: lookup("OIDC_ISSUER_URL").filter(|url| !url.is_empty()),
            lms_root_url: lookup("LMS_ROOT_URL").unwrap_or_else(|| DEFAULT_LMS_ROOT_URL.to_string()),
            enable_enrollment_reset: parse_flag(&lookup, "ENABLE_ENROLLMENT_RESET")?,
            expiration_days: parse_or(&lookup, "WAITING_ENROLLMENT_EXPIRATION_DAYS", DEFAULT_EXPIRATION_DAYS)?,
            expiration_interval: Duration::from_secs(parse_or(
                &lookup,
                "EXPIRATION_INTERVAL_SECS",
                DEFAULT_EXPIRATION_INTERVAL_SECS,
            )?),
        })
    }

    /// Settings for tests and tools that never read the environment
    pub fn with_database_url(database_url: &str) -> Self {
        Self {
            database_url: database_url.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            oidc_issuer_url: None,
            lms_root_url: DEFAULT_LMS_ROOT_URL.to_string(),
            enable_enrollment_reset: false,
            expiration_days: DEFAULT_EXPIRATION_DAYS,
            expiration_interval: Duration::from_secs(DEFAULT_EXPIRATION_INTERVAL_SECS),
        }
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn parse_flag(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<bool, ConfigError> {
    match lookup(name) {
        Some(value) => match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "" | "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { name, value }),
        },
        None => Ok(false),
    }
}
