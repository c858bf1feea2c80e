//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (POSTLINE_*)
//! 2. TOML config file (if POSTLINE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::coordinator::RequestIdPolicy;
use crate::store::PgConfig;

mod validation;

pub use validation::ConfigError;

/// Which cache store the server opens at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Redis,
    Sqlite,
    Memory,
}

/// Which durable store the server opens at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Postgres,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (POSTLINE_*)
/// 2. TOML config file (if POSTLINE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Cache backend: redis, sqlite or memory.
    ///
    /// Set via POSTLINE_CACHE_BACKEND environment variable.
    #[serde(default)]
    pub cache_backend: CacheBackend,

    /// Redis host for the redis cache backend.
    ///
    /// Set via POSTLINE_REDIS_HOST environment variable.
    #[serde(default = "default_redis_host")]
    pub redis_host: String,

    #[serde(default = "default_redis_port")]
    pub redis_port: u16,

    #[serde(default)]
    pub redis_db: u32,

    /// Cache entry time-to-live in seconds.
    ///
    /// Set via POSTLINE_CACHE_TTL_SECS environment variable.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Durable backend: sqlite or postgres.
    ///
    /// Set via POSTLINE_STORE_BACKEND environment variable.
    #[serde(default)]
    pub store_backend: StoreBackend,

    /// Path to the SQLite database, used by the sqlite store and cache backends.
    ///
    /// Set via POSTLINE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// PostgreSQL host.
    ///
    /// Set via POSTLINE_PG_HOST environment variable.
    #[serde(default = "default_pg_host")]
    pub pg_host: String,

    #[serde(default = "default_pg_port")]
    pub pg_port: u16,

    #[serde(default = "default_pg_user")]
    pub pg_user: String,

    /// Set via POSTLINE_PG_PASSWORD; prefer a secret store over a config file.
    #[serde(default = "default_pg_password")]
    pub pg_password: String,

    #[serde(default = "default_pg_database")]
    pub pg_database: String,

    /// Handling of calls that arrive without a request id.
    ///
    /// Set via POSTLINE_MISSING_REQUEST_ID environment variable (fallback, reject, generate).
    #[serde(default)]
    pub missing_request_id: RequestIdPolicy,

    /// Base URL of the model-serving backend.
    ///
    /// Set via POSTLINE_INFERENCE_HOST environment variable.
    #[serde(default = "default_inference_host")]
    pub inference_host: String,

    /// Inference request timeout in milliseconds.
    ///
    /// Set via POSTLINE_INFERENCE_TIMEOUT_MS environment variable.
    #[serde(default = "default_inference_timeout_ms")]
    pub inference_timeout_ms: u64,
}

fn default_redis_host() -> String {
    "redis-service".into()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./postline.sqlite")
}

fn default_pg_host() -> String {
    "postgresql-service".into()
}

fn default_pg_port() -> u16 {
    5432
}

fn default_pg_user() -> String {
    "user".into()
}

fn default_pg_password() -> String {
    "password".into()
}

fn default_pg_database() -> String {
    "ollama".into()
}

fn default_inference_host() -> String {
    "http://localhost:11434".into()
}

fn default_inference_timeout_ms() -> u64 {
    30_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_backend: CacheBackend::default(),
            redis_host: default_redis_host(),
            redis_port: default_redis_port(),
            redis_db: 0,
            cache_ttl_secs: default_cache_ttl_secs(),
            store_backend: StoreBackend::default(),
            db_path: default_db_path(),
            pg_host: default_pg_host(),
            pg_port: default_pg_port(),
            pg_user: default_pg_user(),
            pg_password: default_pg_password(),
            pg_database: default_pg_database(),
            missing_request_id: RequestIdPolicy::default(),
            inference_host: default_inference_host(),
            inference_timeout_ms: default_inference_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Cache TTL as Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Inference timeout as Duration for use with reqwest.
    pub fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference_timeout_ms)
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/{}", self.redis_host, self.redis_port, self.redis_db)
    }

    pub fn pg_config(&self) -> PgConfig {
        PgConfig {
            host: self.pg_host.clone(),
            port: self.pg_port,
            user: self.pg_user.clone(),
            password: self.pg_password.clone(),
            database: self.pg_database.clone(),
            ..Default::default()
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `POSTLINE_`
    /// 2. TOML file from `POSTLINE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("POSTLINE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("POSTLINE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into()),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
