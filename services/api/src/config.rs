//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Presigned URLs cannot outlive a week.
const MAX_LINK_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub environment: String,
    pub question_bucket: String,
    pub generated_bucket: String,
    pub papers_table: String,
    pub database_url: String,
    pub user_pool_id: String,
    pub user_pool_client_id: String,
    pub jwks_url: String,
    pub question_suffix: String,
    pub link_ttl: Duration,
    pub cors_allowed_origin: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ConfigError::MissingVar(name.to_string()))
        };

        // --- Server Settings ---
        let bind_address_str = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Storage Settings ---
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string());
        let question_bucket = lookup("QUESTION_BUCKET")
            .unwrap_or_else(|| format!("{environment}-question-paper-generator-question-pdfs"));
        let generated_bucket = lookup("GENERATED_BUCKET")
            .unwrap_or_else(|| format!("{environment}-question-paper-generator-generated-papers"));
        let papers_table = lookup("PAPERS_TABLE")
            .unwrap_or_else(|| format!("{environment}-question-paper-generator-papers"));
        if papers_table.is_empty()
            || !papers_table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ConfigError::InvalidValue(
                "PAPERS_TABLE".to_string(),
                format!("'{}' may only contain letters, digits, '_' and '-'", papers_table),
            ));
        }
        let database_url = required("DATABASE_URL")?;

        // --- Identity Provider Settings ---
        let user_pool_id = required("USER_POOL_ID")?;
        let user_pool_client_id = required("USER_POOL_CLIENT_ID")?;
        let jwks_url = match lookup("JWKS_URL") {
            Some(url) => url,
            None => {
                let region = pool_region(&user_pool_id).ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "USER_POOL_ID".to_string(),
                        format!("'{}' is not of the form <region>_<id>", user_pool_id),
                    )
                })?;
                format!(
                    "https://cognito-idp.{region}.amazonaws.com/{user_pool_id}/.well-known/jwks.json"
                )
            }
        };

        // --- Paper Settings ---
        let question_suffix = lookup("QUESTION_FILE_SUFFIX").unwrap_or_else(|| ".pdf".to_string());
        let link_ttl_str =
            lookup("DOWNLOAD_LINK_TTL_SECONDS").unwrap_or_else(|| "3600".to_string());
        let link_ttl_seconds = link_ttl_str
            .parse::<u64>()
            .ok()
            .filter(|secs| (1..=MAX_LINK_TTL_SECONDS).contains(secs))
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "DOWNLOAD_LINK_TTL_SECONDS".to_string(),
                    format!("'{}' is not between 1 and {}", link_ttl_str, MAX_LINK_TTL_SECONDS),
                )
            })?;

        let cors_allowed_origin = lookup("CORS_ALLOWED_ORIGIN").filter(|o| !o.is_empty());

        Ok(Self {
            bind_address,
            log_level,
            environment,
            question_bucket,
            generated_bucket,
            papers_table,
            database_url,
            user_pool_id,
            user_pool_client_id,
            jwks_url,
            question_suffix,
            link_ttl: Duration::from_secs(link_ttl_seconds),
            cors_allowed_origin,
        })
    }

    /// The AWS region the user pool lives in.
    pub fn user_pool_region(&self) -> Option<&str> {
        pool_region(&self.user_pool_id)
    }
}

/// User pool ids look like `eu-west-1_AbCdEf123`.
fn pool_region(user_pool_id: &str) -> Option<&str> {
    user_pool_id
        .split_once('_')
        .map(|(region, _)| region)
        .filter(|region| !region.is_empty())
}
