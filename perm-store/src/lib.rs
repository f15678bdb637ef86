//! # Perm Store
//!
//! Persists per-identity permission grants and answers the queries the
//! credential checker and admin tooling need.
//!
//! ## Overview
//!
//! A grant is keyed by `(account_id, identity_id)` and holds a
//! [`Method`](perm_rbac::Method) plus an enabled flag. Disabling an identity
//! is the substitute for deleting it; records are never removed implicitly.
//!
//! The perm-store crate handles:
//! - **Store contract**: the async [`PermissionStore`] trait
//! - **Backends**: in-memory and Redis
//! - **Deadlines**: [`TimeoutStore`] bounds every call
//! - **Configuration**: [`StoreConfig`] from environment variables
//!
//! ## Features
//!
//! - `redis`: Redis-backed store for multi-process deployments
//!
//! ## Usage
//!
//! ```rust
//! use perm_rbac::{Method, ResourceType};
//! use perm_store::{MemoryPermissionStore, PermissionStore};
//!
//! # async fn example() -> Result<(), perm_store::StoreError> {
//! let store = MemoryPermissionStore::new();
//! let agent_reader = Method::empty().with(ResourceType::Agent, "a:r");
//!
//! store.write("acc_1", "agent_1", &agent_reader).await?;
//! store.write("acc_1", "agent_2", &agent_reader).await?;
//! store.set_enabled("acc_1", "agent_2", false).await?;
//!
//! let ids = store
//!     .list_identities_by_method("acc_1", &agent_reader, "", 100)
//!     .await?;
//! assert_eq!(ids, vec!["agent_1".to_string()]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Consistency
//!
//! Listings scan records in identity order and filter them in memory. Writes
//! and state toggles that race a scan are eventually visible: an identity
//! disabled while a caller pages through results may still appear in the
//! next page.

pub mod config;
pub mod store;
pub mod timeout;

#[cfg(feature = "redis")]
pub mod redis;

// Re-export main types
pub use config::{ConfigError, StoreBackend, StoreConfig};
pub use store::{MemoryPermissionStore, PermissionStore, StoreError, StoreResult, StoredGrant};
pub use timeout::TimeoutStore;

#[cfg(feature = "redis")]
pub use redis::RedisPermissionStore;
