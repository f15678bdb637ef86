//! Redis-backed permission store for distributed deployments.
//!
//! Each account owns three keys:
//!
//! ```text
//! {prefix}:methods:{account}   HASH  identity -> JSON method
//! {prefix}:states:{account}    HASH  identity -> "1" | "0"
//! {prefix}:ids:{account}       ZSET  identity (score 0, ordered by member)
//! ```
//!
//! Listing walks the sorted set with `ZRANGEBYLEX` in batches and filters
//! each batch in memory. A missing state field means enabled.

use async_trait::async_trait;
use perm_rbac::Method;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};

use crate::store::{validate_key, PermissionStore, StoreError, StoreResult};

const ENABLED: &str = "1";
const DISABLED: &str = "0";

/// Redis-backed permission store.
///
/// # Example
///
/// ```rust,no_run
/// use perm_store::RedisPermissionStore;
///
/// async fn example() -> Result<(), Box<dyn std::error::Error>> {
///     let store = RedisPermissionStore::new("redis://localhost:6379", "perm", 500).await?;
///     Ok(())
/// }
/// ```
pub struct RedisPermissionStore {
    /// Shared multiplexed connection
    conn: MultiplexedConnection,

    /// Key prefix for all Redis operations
    prefix: String,

    /// Identity ids fetched per listing round trip
    scan_batch: usize,
}

impl std::fmt::Debug for RedisPermissionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPermissionStore")
            .field("prefix", &self.prefix)
            .field("scan_batch", &self.scan_batch)
            .finish()
    }
}

fn backend(e: RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() {
        StoreError::ConnectionError(e.to_string())
    } else {
        StoreError::BackendError(e.to_string())
    }
}

impl RedisPermissionStore {
    /// Connect to Redis.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., `redis://localhost:6379`)
    /// * `prefix` - Key prefix for Redis operations (e.g., `perm`)
    /// * `scan_batch` - Identity ids fetched per listing round trip
    pub async fn new(redis_url: &str, prefix: &str, scan_batch: usize) -> StoreResult<Self> {
        let client =
            Client::open(redis_url).map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        tracing::info!(prefix = %prefix, "Redis permission store connected");

        Ok(Self {
            conn,
            prefix: prefix.to_string(),
            scan_batch: scan_batch.max(1),
        })
    }

    fn methods_key(&self, account_id: &str) -> String {
        format!("{}:methods:{}", self.prefix, account_id)
    }

    fn states_key(&self, account_id: &str) -> String {
        format!("{}:states:{}", self.prefix, account_id)
    }

    fn ids_key(&self, account_id: &str) -> String {
        format!("{}:ids:{}", self.prefix, account_id)
    }
}

/// Keep the ids of one scanned batch whose record is enabled and satisfies
/// `required`, at most `room` of them.
///
/// `methods` and `states` are the `HMGET` replies for `batch`, in the same
/// order. A missing method reads as empty and a missing state as enabled.
/// Records that fail to decode are skipped.
fn filter_batch(
    account_id: &str,
    batch: &[String],
    methods: Vec<Option<String>>,
    states: Vec<Option<String>>,
    required: &Method,
    room: usize,
) -> Vec<String> {
    let mut kept = Vec::new();
    if room == 0 {
        return kept;
    }

    for ((id, payload), state) in batch.iter().zip(methods).zip(states) {
        if state.as_deref() == Some(DISABLED) {
            continue;
        }

        let stored = match payload {
            Some(payload) => match serde_json::from_str::<Method>(&payload) {
                Ok(method) => method,
                Err(e) => {
                    tracing::warn!(
                        account_id = %account_id,
                        identity_id = %id,
                        error = %e,
                        "Skipping unreadable permission record"
                    );
                    continue;
                }
            },
            None => Method::empty(),
        };

        if stored.satisfies(required) {
            kept.push(id.clone());
            if kept.len() == room {
                break;
            }
        }
    }

    kept
}

/// Lower bound for `ZRANGEBYLEX`, exclusive of the cursor.
fn lex_after(cursor: &str) -> String {
    if cursor.is_empty() {
        "-".to_string()
    } else {
        format!("({}", cursor)
    }
}

#[async_trait]
impl PermissionStore for RedisPermissionStore {
    async fn write(&self, account_id: &str, identity_id: &str, method: &Method) -> StoreResult<()> {
        validate_key(account_id, identity_id)?;
        let payload = serde_json::to_string(method)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;

        let mut conn = self.conn.clone();
        redis::pipe()
            .atomic()
            .hset(self.methods_key(account_id), identity_id, payload)
            .ignore()
            .zadd(self.ids_key(account_id), identity_id, 0)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(backend)?;

        tracing::debug!(account_id = %account_id, identity_id = %identity_id, "Permission written to Redis");
        Ok(())
    }

    async fn read(&self, account_id: &str, identity_id: &str) -> StoreResult<Method> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn
            .hget(self.methods_key(account_id), identity_id)
            .await
            .map_err(backend)?;

        match payload {
            Some(payload) => serde_json::from_str(&payload)
                .map_err(|e| StoreError::SerializationError(e.to_string())),
            None => Ok(Method::empty()),
        }
    }

    async fn set_enabled(&self, account_id: &str, identity_id: &str, enabled: bool) -> StoreResult<()> {
        validate_key(account_id, identity_id)?;
        let state = if enabled { ENABLED } else { DISABLED };

        let mut conn = self.conn.clone();
        redis::pipe()
            .atomic()
            .hset(self.states_key(account_id), identity_id, state)
            .ignore()
            .zadd(self.ids_key(account_id), identity_id, 0)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(backend)?;

        tracing::debug!(
            account_id = %account_id,
            identity_id = %identity_id,
            enabled,
            "Permission state written to Redis"
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
        let mut found = Vec::new();
        if limit == 0 {
            return Ok(found);
        }

        let ids_key = self.ids_key(account_id);
        let methods_key = self.methods_key(account_id);
        let states_key = self.states_key(account_id);
        let mut conn = self.conn.clone();
        let mut after = cursor.to_string();

        loop {
            let batch: Vec<String> = redis::cmd("ZRANGEBYLEX")
                .arg(&ids_key)
                .arg(lex_after(&after))
                .arg("+")
                .arg("LIMIT")
                .arg(0)
                .arg(self.scan_batch)
                .query_async(&mut conn)
                .await
                .map_err(backend)?;

            let Some(last) = batch.last().cloned() else {
                break;
            };

            let (methods, states): (Vec<Option<String>>, Vec<Option<String>>) = redis::pipe()
                .cmd("HMGET")
                .arg(&methods_key)
                .arg(&batch)
                .cmd("HMGET")
                .arg(&states_key)
                .arg(&batch)
                .query_async(&mut conn)
                .await
                .map_err(backend)?;

            let kept = filter_batch(
                account_id,
                &batch,
                methods,
                states,
                required,
                limit - found.len(),
            );
            found.extend(kept);
            if found.len() == limit {
                return Ok(found);
            }

            if batch.len() < self.scan_batch {
                break;
            }
            after = last;
        }

        Ok(found)
    }
}
