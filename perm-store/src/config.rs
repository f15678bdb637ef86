//! Permission store configuration.
//!
//! Selects and tunes the store backend. Configuration is loaded from
//! environment variables with defaults suitable for local development.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::store::{MemoryPermissionStore, PermissionStore, StoreResult};
use crate::timeout::TimeoutStore;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Storage backend for permission records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local maps.
    Memory,
    /// Redis hashes and sorted sets (feature `redis`).
    Redis,
}

impl StoreBackend {
    /// Parse backend name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Some(StoreBackend::Memory),
            "redis" => Some(StoreBackend::Redis),
            _ => None,
        }
    }
}

/// Permission store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Which backend holds the records.
    pub backend: StoreBackend,

    /// Redis connection URL (e.g., redis://localhost:6379).
    pub redis_url: String,

    /// Prefix for all Redis keys.
    pub key_prefix: String,

    /// Identity ids fetched per round trip while listing.
    pub scan_batch: usize,

    /// Per-call deadline in milliseconds. Zero disables the deadline.
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    /// Returns default configuration suitable for local development.
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: "perm".to_string(),
            scan_batch: 500,
            timeout_ms: 2_000,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PERM_STORE_BACKEND`: `memory` or `redis` (default: memory)
    /// - `PERM_REDIS_URL`: Redis URL (default: redis://127.0.0.1:6379)
    /// - `PERM_KEY_PREFIX`: Redis key prefix (default: perm)
    /// - `PERM_SCAN_BATCH`: ids fetched per listing round trip (default: 500)
    /// - `PERM_STORE_TIMEOUT_MS`: per-call deadline, 0 to disable (default: 2000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let default = Self::default();

        let backend = match lookup("PERM_STORE_BACKEND") {
            Some(value) => StoreBackend::parse(&value).ok_or_else(|| ConfigError::InvalidValue {
                key: "PERM_STORE_BACKEND".to_string(),
                message: format!("unknown backend '{}'", value),
            })?,
            None => default.backend,
        };

        let config = Self {
            backend,
            redis_url: lookup("PERM_REDIS_URL").unwrap_or(default.redis_url),
            key_prefix: lookup("PERM_KEY_PREFIX").unwrap_or(default.key_prefix),
            scan_batch: parse_number(&lookup, "PERM_SCAN_BATCH")?.unwrap_or(default.scan_batch),
            timeout_ms: parse_number(&lookup, "PERM_STORE_TIMEOUT_MS")?.unwrap_or(default.timeout_ms),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values that would make the store unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan_batch == 0 {
            return Err(ConfigError::InvalidValue {
                key: "PERM_SCAN_BATCH".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.key_prefix.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "PERM_KEY_PREFIX".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Get the per-call deadline as a Duration, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// Open the configured store.
    ///
    /// The store is wrapped in a [`TimeoutStore`] when a deadline is set.
    pub async fn connect(&self) -> StoreResult<Arc<dyn PermissionStore>> {
        let store: Arc<dyn PermissionStore> = match self.backend {
            StoreBackend::Memory => Arc::new(MemoryPermissionStore::new()),
            #[cfg(feature = "redis")]
            StoreBackend::Redis => Arc::new(
                crate::redis::RedisPermissionStore::new(
                    &self.redis_url,
                    &self.key_prefix,
                    self.scan_batch,
                )
                .await?,
            ),
            #[cfg(not(feature = "redis"))]
            StoreBackend::Redis => {
                return Err(crate::store::StoreError::BackendError(
                    "redis backend requires the `redis` feature".to_string(),
                ))
            }
        };

        tracing::info!(backend = ?self.backend, "Permission store ready");

        let store: Arc<dyn PermissionStore> = match self.timeout() {
            Some(timeout) => Arc::new(TimeoutStore::new(store, timeout)),
            None => store,
        };
        Ok(store)
    }
}

fn parse_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("'{}' is not a number", value),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.backend, StoreBackend::Memory);
        assert_eq!(config.scan_batch, 500);
        assert_eq!(config.timeout(), Some(Duration::from_secs(2)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("PERM_STORE_BACKEND", "Redis"),
            ("PERM_REDIS_URL", "redis://cache:6379/2"),
            ("PERM_KEY_PREFIX", "acl"),
            ("PERM_SCAN_BATCH", " 1000 "),
            ("PERM_STORE_TIMEOUT_MS", "0"),
        ]))
        .unwrap();

        assert_eq!(config.backend, StoreBackend::Redis);
        assert_eq!(config.redis_url, "redis://cache:6379/2");
        assert_eq!(config.key_prefix, "acl");
        assert_eq!(config.scan_batch, 1000);
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        assert!(StoreConfig::from_lookup(lookup(&[("PERM_STORE_BACKEND", "cassandra")])).is_err());
        assert!(StoreConfig::from_lookup(lookup(&[("PERM_SCAN_BATCH", "lots")])).is_err());
        assert!(StoreConfig::from_lookup(lookup(&[("PERM_SCAN_BATCH", "0")])).is_err());
        assert!(StoreConfig::from_lookup(lookup(&[("PERM_KEY_PREFIX", "")])).is_err());
    }

    #[tokio::test]
    async fn test_connect_memory_backend() {
        let store = StoreConfig::default().connect().await.unwrap();
        assert!(store.read("acc", "u1").await.unwrap().is_empty());
    }

    #[cfg(not(feature = "redis"))]
    #[tokio::test]
    async fn test_connect_redis_without_feature() {
        let config = StoreConfig {
            backend: StoreBackend::Redis,
            ..StoreConfig::default()
        };
        assert!(matches!(
            config.connect().await,
            Err(StoreError::BackendError(_))
        ));
    }
}
