//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::{AppConfig, CacheBackend, StoreBackend};
use thiserror::Error;

/// Longest accepted cache TTL: 30 days.
const MAX_CACHE_TTL_SECS: u64 = 30 * 24 * 3600;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_ttl_secs` is 0 or exceeds 30 days
    /// - `inference_timeout_ms` is less than 100ms or exceeds 10 minutes
    /// - `inference_host` is not an http(s) URL
    ///
    /// Returns `ConfigError::Missing` if the selected backend lacks its host
    /// or database name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "cache_ttl_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.cache_ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(ConfigError::Invalid {
                field: "cache_ttl_secs".into(),
                reason: "must not exceed 30 days (2592000s)".into(),
            });
        }

        if self.inference_timeout_ms < 100 {
            return Err(ConfigError::Invalid {
                field: "inference_timeout_ms".into(),
                reason: "must be at least 100ms".into(),
            });
        }
        if self.inference_timeout_ms > 600_000 {
            return Err(ConfigError::Invalid {
                field: "inference_timeout_ms".into(),
                reason: "must not exceed 10 minutes (600000ms)".into(),
            });
        }

        if !(self.inference_host.starts_with("http://") || self.inference_host.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: "inference_host".into(),
                reason: "must start with http:// or https://".into(),
            });
        }

        if self.cache_backend == CacheBackend::Redis && self.redis_host.is_empty() {
            return Err(ConfigError::Missing {
                field: "redis_host".into(),
                hint: "Set POSTLINE_REDIS_HOST or choose another POSTLINE_CACHE_BACKEND".into(),
            });
        }

        if self.store_backend == StoreBackend::Postgres {
            if self.pg_host.is_empty() {
                return Err(ConfigError::Missing {
                    field: "pg_host".into(),
                    hint: "Set POSTLINE_PG_HOST environment variable".into(),
                });
            }
            if self.pg_database.is_empty() {
                return Err(ConfigError::Missing {
                    field: "pg_database".into(),
                    hint: "Set POSTLINE_PG_DATABASE environment variable".into(),
                });
            }
        }

        let uses_sqlite = self.store_backend == StoreBackend::Sqlite || self.cache_backend == CacheBackend::Sqlite;
        if uses_sqlite && self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Missing {
                field: "db_path".into(),
                hint: "Set POSTLINE_DB_PATH environment variable".into(),
            });
        }

        if self.cache_backend == CacheBackend::Memory {
            tracing::warn!("memory cache backend selected; cached results are lost on restart");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_ttl_zero() {
        let config = AppConfig { cache_ttl_secs: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_ttl_secs"));
    }

    #[test]
    fn test_validate_ttl_exceeds_limit() {
        let config = AppConfig { cache_ttl_secs: MAX_CACHE_TTL_SECS + 1, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_ttl_secs"));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let config = AppConfig { inference_timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "inference_timeout_ms"));

        let config = AppConfig { inference_timeout_ms: 600_001, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "inference_timeout_ms"));
    }

    #[test]
    fn test_validate_inference_host_scheme() {
        let config = AppConfig { inference_host: "ollama:11434".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "inference_host"));
    }

    #[test]
    fn test_validate_missing_redis_host() {
        let config = AppConfig { redis_host: String::new(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Missing { field, .. }) if field == "redis_host"));

        let config = AppConfig { redis_host: String::new(), cache_backend: CacheBackend::Memory, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_postgres_requires_database() {
        let config =
            AppConfig { store_backend: StoreBackend::Postgres, pg_database: String::new(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Missing { field, .. }) if field == "pg_database"));
    }

    #[test]
    fn test_validate_sqlite_requires_path() {
        let config = AppConfig { db_path: PathBuf::new(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Missing { field, .. }) if field == "db_path"));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig { cache_ttl_secs: 1, inference_timeout_ms: 100, ..Default::default() };
        assert!(config.validate().is_ok());

        let config =
            AppConfig { cache_ttl_secs: MAX_CACHE_TTL_SECS, inference_timeout_ms: 600_000, ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
