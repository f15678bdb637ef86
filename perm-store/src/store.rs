//! Permission store implementation
//!
//! This module provides the permission store abstraction and the in-memory
//! implementation used by single-process deployments and tests.

use async_trait::async_trait;
use perm_rbac::Method;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

/// Permission store error types.
///
/// These are transport-level failures. They mean the grant could not be
/// determined, never that access was denied.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Store is unreachable
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Call did not finish in time
    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    /// Stored record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Backend rejected the command
    #[error("Backend error: {0}")]
    BackendError(String),

    /// Account or identity id cannot key a record
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Result type for permission store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Whether a caller-side retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::ConnectionError(_) | StoreError::Timeout(_))
    }
}

/// Reject keys a record cannot be stored under.
///
/// An empty identity id would collide with the empty listing cursor, and an
/// empty account id names no tenant.
pub(crate) fn validate_key(account_id: &str, identity_id: &str) -> StoreResult<()> {
    if account_id.is_empty() {
        return Err(StoreError::InvalidKey("account id is empty".to_string()));
    }
    if identity_id.is_empty() {
        return Err(StoreError::InvalidKey("identity id is empty".to_string()));
    }
    Ok(())
}

/// The persisted record for one identity of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredGrant {
    /// Granted capabilities
    pub method: Method,
    /// Disabled identities keep their method but are excluded from listings
    pub enabled: bool,
}

impl StoredGrant {
    /// A new, enabled grant.
    pub fn new(method: Method) -> Self {
        Self {
            method,
            enabled: true,
        }
    }
}

impl Default for StoredGrant {
    fn default() -> Self {
        Self::new(Method::empty())
    }
}

/// Permission store trait: persists and queries per-identity grants.
///
/// All operations are keyed by account id and identity id. Implementations
/// must support concurrent reads, concurrent writes to different keys, and
/// writes racing a listing. Listings are eventually consistent: a record
/// toggled while a caller pages through results may show up in one more
/// page.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Upsert the method of an identity.
    ///
    /// New records are enabled; the flag of an existing record is kept.
    /// Empty account or identity ids fail with [`StoreError::InvalidKey`].
    async fn write(&self, account_id: &str, identity_id: &str, method: &Method) -> StoreResult<()>;

    /// Read the method of an identity. Missing records read as
    /// [`Method::empty`].
    async fn read(&self, account_id: &str, identity_id: &str) -> StoreResult<Method>;

    /// Enable or disable an identity without touching its method.
    ///
    /// Toggling a missing record creates it with an empty method. Empty
    /// account or identity ids fail with [`StoreError::InvalidKey`].
    async fn set_enabled(&self, account_id: &str, identity_id: &str, enabled: bool) -> StoreResult<()>;

    /// List enabled identities of an account whose method satisfies
    /// `required`.
    ///
    /// Returns at most `limit` identity ids strictly greater than `cursor`
    /// (an empty cursor starts from the beginning), in lexicographic order.
    /// Pass the last id of a page as the cursor of the next one.
    async fn list_identities_by_method(
        &self,
        account_id: &str,
        required: &Method,
        cursor: &str,
        limit: usize,
    ) -> StoreResult<Vec<String>>;
}

#[async_trait]
impl<S: PermissionStore + ?Sized> PermissionStore for Arc<S> {
    async fn write(&self, account_id: &str, identity_id: &str, method: &Method) -> StoreResult<()> {
        (**self).write(account_id, identity_id, method).await
    }

    async fn read(&self, account_id: &str, identity_id: &str) -> StoreResult<Method> {
        (**self).read(account_id, identity_id).await
    }

    async fn set_enabled(&self, account_id: &str, identity_id: &str, enabled: bool) -> StoreResult<()> {
        (**self).set_enabled(account_id, identity_id, enabled).await
    }

    async fn list_identities_by_method(
        &self,
        account_id: &str,
        required: &Method,
        cursor: &str,
        limit: usize,
    ) -> StoreResult<Vec<String>> {
        (**self)
            .list_identities_by_method(account_id, required, cursor, limit)
            .await
    }
}

/// In-memory permission store.
///
/// Records live in one ordered map per account, so listings walk identity
/// ids in order without sorting. Suitable for single-process deployments
/// and tests; use the Redis backend to share grants between processes.
#[derive(Default)]
pub struct MemoryPermissionStore {
    /// Records per account, ordered by identity id
    accounts: RwLock<HashMap<String, BTreeMap<String, StoredGrant>>>,
}

impl std::fmt::Debug for MemoryPermissionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPermissionStore").finish_non_exhaustive()
    }
}

impl MemoryPermissionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Full record of an identity, if one exists.
    pub async fn grant(&self, account_id: &str, identity_id: &str) -> Option<StoredGrant> {
        let accounts = self.accounts.read().await;
        accounts
            .get(account_id)
            .and_then(|records| records.get(identity_id))
            .copied()
    }

    /// Number of records, enabled or not, held for an account.
    pub async fn len(&self, account_id: &str) -> usize {
        let accounts = self.accounts.read().await;
        accounts.get(account_id).map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl PermissionStore for MemoryPermissionStore {
    async fn write(&self, account_id: &str, identity_id: &str, method: &Method) -> StoreResult<()> {
        validate_key(account_id, identity_id)?;

        let mut accounts = self.accounts.write().await;
        accounts
            .entry(account_id.to_string())
            .or_default()
            .entry(identity_id.to_string())
            .and_modify(|grant| grant.method = *method)
            .or_insert_with(|| StoredGrant::new(*method));

        tracing::debug!(account_id = %account_id, identity_id = %identity_id, "Permission written");
        Ok(())
    }

    async fn read(&self, account_id: &str, identity_id: &str) -> StoreResult<Method> {
        Ok(self
            .grant(account_id, identity_id)
            .await
            .map(|grant| grant.method)
            .unwrap_or_default())
    }

    async fn set_enabled(&self, account_id: &str, identity_id: &str, enabled: bool) -> StoreResult<()> {
        validate_key(account_id, identity_id)?;

        let mut accounts = self.accounts.write().await;
        accounts
            .entry(account_id.to_string())
            .or_default()
            .entry(identity_id.to_string())
            .or_default()
            .enabled = enabled;

        tracing::debug!(
            account_id = %account_id,
            identity_id = %identity_id,
            enabled,
            "Permission state updated"
        );
        Ok(())
    }

    async fn list_identities_by_method(
        &self,
        account_id: &str,
        required: &Method,
        cursor: &str,
        limit: usize,
    ) -> StoreResult<Vec<String>> {
        let accounts = self.accounts.read().await;
        let Some(records) = accounts.get(account_id) else {
            return Ok(Vec::new());
        };

        let start = if cursor.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(cursor)
        };

        Ok(records
            .range::<str, _>((start, Bound::Unbounded))
            .filter(|(_, grant)| grant.enabled && grant.method.satisfies(required))
            .map(|(id, _)| id.clone())
            .take(limit)
            .collect())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use perm_rbac::ResourceType;

    fn agent_read() -> Method {
        Method::empty().with(ResourceType::Agent, "a:r")
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = MemoryPermissionStore::new();
        let method = agent_read().with(ResourceType::Account, "a:r");

        store.write("acc_crud", "user_crud", &method).await.unwrap();
        let read = store.read("acc_crud", "user_crud").await.unwrap();

        assert!(read.satisfies(&method));
        assert!(method.satisfies(&read));
    }

    #[tokio::test]
    async fn test_read_missing_is_empty() {
        let store = MemoryPermissionStore::new();
        assert_eq!(store.read("acc", "nobody").await.unwrap(), Method::empty());

        store.write("acc", "someone", &agent_read()).await.unwrap();
        assert_eq!(store.read("acc", "nobody").await.unwrap(), Method::empty());
        assert_eq!(store.read("other_acc", "someone").await.unwrap(), Method::empty());
    }

    #[tokio::test]
    async fn test_write_is_last_write_wins_and_keeps_state() {
        let store = MemoryPermissionStore::new();
        store.write("acc", "u1", &agent_read()).await.unwrap();
        store.set_enabled("acc", "u1", false).await.unwrap();

        let updated = Method::empty().with(ResourceType::Tag, "a:crud");
        store.write("acc", "u1", &updated).await.unwrap();
        store.write("acc", "u1", &updated).await.unwrap();

        let grant = store.grant("acc", "u1").await.unwrap();
        assert_eq!(grant.method, updated);
        assert!(!grant.enabled);
        assert_eq!(store.len("acc").await, 1);
    }

    #[tokio::test]
    async fn test_set_enabled_keeps_method() {
        let store = MemoryPermissionStore::new();
        store.write("acc", "u1", &agent_read()).await.unwrap();

        store.set_enabled("acc", "u1", false).await.unwrap();
        assert_eq!(store.read("acc", "u1").await.unwrap(), agent_read());

        store.set_enabled("acc", "u1", true).await.unwrap();
        assert!(store.grant("acc", "u1").await.unwrap().enabled);
    }

    #[tokio::test]
    async fn test_set_enabled_on_missing_record_creates_it() {
        let store = MemoryPermissionStore::new();
        store.set_enabled("acc", "ghost", false).await.unwrap();

        let grant = store.grant("acc", "ghost").await.unwrap();
        assert_eq!(grant.method, Method::empty());
        assert!(!grant.enabled);
    }

    #[tokio::test]
    async fn test_list_filters_disabled_and_unsatisfying() {
        // 3000 identities: the first 1500 disabled, the last 800 empty.
        let store = MemoryPermissionStore::new();
        let (total, disabled, empty) = (3000, 1500, 800);
        let account = "acc_listperm";

        for i in 0..total {
            let id = format!("user_listperm_{}", i);
            let method = if i >= total - empty {
                Method::empty()
            } else {
                agent_read()
            };
            store.write(account, &id, &method).await.unwrap();
        }
        for i in 0..disabled {
            let id = format!("user_listperm_{}", i);
            store.set_enabled(account, &id, false).await.unwrap();
        }

        let ids = store
            .list_identities_by_method(account, &agent_read(), "", total)
            .await
            .unwrap();

        assert_eq!(ids.len(), total - disabled - empty);
        for id in &ids {
            let n: usize = id.rsplit('_').next().unwrap().parse().unwrap();
            assert!(n >= disabled, "inactive identity {} listed", id);
            assert!(n < total - empty, "identity {} without grant listed", id);
        }
    }

    #[tokio::test]
    async fn test_list_pagination_is_exhaustive_and_ordered() {
        let store = MemoryPermissionStore::new();
        for i in 0..250 {
            let method = if i % 3 == 0 { Method::empty() } else { agent_read() };
            store.write("acc", &format!("id_{:04}", i), &method).await.unwrap();
        }

        let mut seen = Vec::new();
        let mut cursor = String::new();
        loop {
            let page = store
                .list_identities_by_method("acc", &agent_read(), &cursor, 17)
                .await
                .unwrap();
            if page.is_empty() {
                break;
            }
            assert!(page.len() <= 17);
            cursor = page.last().unwrap().clone();
            seen.extend(page);
        }

        let expected: Vec<String> = (0..250)
            .filter(|i| i % 3 != 0)
            .map(|i| format!("id_{:04}", i))
            .collect();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn test_list_edge_cases() {
        let store = MemoryPermissionStore::new();
        assert!(store
            .list_identities_by_method("missing", &agent_read(), "", 10)
            .await
            .unwrap()
            .is_empty());

        store.write("acc", "a", &agent_read()).await.unwrap();
        store.write("acc", "b", &Method::empty()).await.unwrap();

        // limit zero
        assert!(store
            .list_identities_by_method("acc", &agent_read(), "", 0)
            .await
            .unwrap()
            .is_empty());

        // an empty requirement matches every enabled record
        let all = store
            .list_identities_by_method("acc", &Method::empty(), "", 10)
            .await
            .unwrap();
        assert_eq!(all, vec!["a".to_string(), "b".to_string()]);

        // cursor past the end
        assert!(store
            .list_identities_by_method("acc", &Method::empty(), "zzz", 10)
            .await
            .unwrap()
            .is_empty());

        // cursor need not be an existing id
        let after = store
            .list_identities_by_method("acc", &Method::empty(), "aa", 10)
            .await
            .unwrap();
        assert_eq!(after, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_ids_are_rejected() {
        let store = MemoryPermissionStore::new();

        for (account, identity) in [("acc", ""), ("", "u1"), ("", "")] {
            let err = store.write(account, identity, &agent_read()).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidKey(_)));
            assert!(!err.is_transient());

            let err = store.set_enabled(account, identity, true).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidKey(_)));
        }
        assert_eq!(store.len("acc").await, 0);
        assert_eq!(store.len("").await, 0);
    }

    #[tokio::test]
    async fn test_single_item_pages_never_repeat() {
        let store = MemoryPermissionStore::new();
        assert!(store.write("acc", "", &agent_read()).await.is_err());
        store.write("acc", "a", &agent_read()).await.unwrap();
        store.write("acc", "b", &agent_read()).await.unwrap();

        let mut seen = Vec::new();
        let mut cursor = String::new();
        for _ in 0..10 {
            let page = store
                .list_identities_by_method("acc", &agent_read(), &cursor, 1)
                .await
                .unwrap();
            let Some(last) = page.last().cloned() else {
                break;
            };
            seen.extend(page);
            cursor = last;
        }
        assert_eq!(seen, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrent_writes_to_disjoint_keys() {
        let store = Arc::new(MemoryPermissionStore::new());
        let mut tasks = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store
                    .write("acc", &format!("u{:02}", i), &agent_read())
                    .await
                    .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let ids = store
            .list_identities_by_method("acc", &agent_read(), "", 100)
            .await
            .unwrap();
        assert_eq!(ids.len(), 32);
    }

    #[tokio::test]
    async fn test_arc_dyn_store() {
        let store: Arc<dyn PermissionStore> = Arc::new(MemoryPermissionStore::new());
        store.write("acc", "u1", &agent_read()).await.unwrap();
        assert_eq!(store.read("acc", "u1").await.unwrap(), agent_read());
    }

    #[test]
    fn test_stored_grant_serde() {
        let grant = StoredGrant::new(agent_read());
        let json = serde_json::to_string(&grant).unwrap();
        let back: StoredGrant = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grant);
        assert!(StoredGrant::default().enabled);
    }
}
