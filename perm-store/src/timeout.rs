//! Per-call deadlines for permission stores.
//!
//! The checker never retries or waits on its own; callers that need a bound
//! on store latency wrap their store in a [`TimeoutStore`].
//!
//! # Example
//!
//! ```rust
//! use perm_store::{MemoryPermissionStore, PermissionStore, TimeoutStore};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), perm_store::StoreError> {
//! let store = TimeoutStore::new(MemoryPermissionStore::new(), Duration::from_millis(250));
//! let method = store.read("acc_1", "agent_1").await?;
//! assert!(method.is_empty());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use perm_rbac::Method;
use std::future::Future;
use std::time::Duration;

use crate::store::{PermissionStore, StoreError, StoreResult};

/// Wraps a store and fails any call that exceeds `timeout` with
/// [`StoreError::Timeout`].
#[derive(Debug)]
pub struct TimeoutStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S: PermissionStore> TimeoutStore<S> {
    /// Bound every call to `inner` by `timeout`.
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// The per-call deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = StoreResult<T>>,
    ) -> StoreResult<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Permission store call timed out"
                );
                Err(StoreError::Timeout(self.timeout))
            }
        }
    }
}

#[async_trait]
impl<S: PermissionStore> PermissionStore for TimeoutStore<S> {
    async fn write(&self, account_id: &str, identity_id: &str, method: &Method) -> StoreResult<()> {
        self.bounded("write", self.inner.write(account_id, identity_id, method))
            .await
    }

    async fn read(&self, account_id: &str, identity_id: &str) -> StoreResult<Method> {
        self.bounded("read", self.inner.read(account_id, identity_id))
            .await
    }

    async fn set_enabled(&self, account_id: &str, identity_id: &str, enabled: bool) -> StoreResult<()> {
        self.bounded(
            "set_enabled",
            self.inner.set_enabled(account_id, identity_id, enabled),
        )
        .await
    }

    async fn list_identities_by_method(
        &self,
        account_id: &str,
        required: &Method,
        cursor: &str,
        limit: usize,
    ) -> StoreResult<Vec<String>> {
        self.bounded(
            "list_identities_by_method",
            self.inner
                .list_identities_by_method(account_id, required, cursor, limit),
        )
        .await
    }
}
