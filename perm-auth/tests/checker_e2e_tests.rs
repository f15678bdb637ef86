//! End-to-End tests for authorization decisions.
//!
//! These tests run the checker against real store implementations and cover
//! the flows an API layer goes through:
//!
//! 1. admin grants a method, agent calls an endpoint
//! 2. admin narrows the grant, the old credential loses access
//! 3. admin lists who may perform an action
//! 4. the store is slow or down

use async_trait::async_trait;
use perm_auth::{AuthError, Authorizer, Credential, Denial};
use perm_rbac::{Action, Method, ResourceType, Tier};
use perm_store::{
    MemoryPermissionStore, PermissionStore, StoreConfig, StoreError, StoreResult, TimeoutStore,
};
use std::sync::Arc;
use std::time::Duration;

/// Test fixture holding one account with an admin and two agents.
struct TestFixture {
    /// Backing store, shared with the authorizer.
    store: Arc<MemoryPermissionStore>,
    /// Authorizer under test.
    authorizer: Authorizer,
}

const ACCOUNT: &str = "acc_demo";

fn admin_method() -> Method {
    Method::empty()
        .with(ResourceType::Agent, "u:-ru- a:crud s:-r-d")
        .with(ResourceType::Permission, "a:-ru-")
        .with(ResourceType::Tag, "a:crud")
}

fn agent_method() -> Method {
    Method::empty()
        .with(ResourceType::Agent, "u:-ru- a:-r--")
        .with(ResourceType::Conversation, "u:cru- a:-r--")
        .with(ResourceType::Tag, "a:-r--")
}

impl TestFixture {
    async fn new() -> Self {
        let store = Arc::new(MemoryPermissionStore::new());
        store.write(ACCOUNT, "admin", &admin_method()).await.unwrap();
        store.write(ACCOUNT, "agent_1", &agent_method()).await.unwrap();
        store.write(ACCOUNT, "agent_2", &agent_method()).await.unwrap();

        let authorizer = Authorizer::new(store.clone());
        Self { store, authorizer }
    }

    fn credential(&self, issuer: &str, method: Method) -> Credential {
        Credential::new(ACCOUNT, issuer, method)
    }
}

#[tokio::test]
async fn test_agent_reads_own_profile_but_not_others_write() {
    let fx = TestFixture::new().await;
    let cred = fx.credential("agent_1", agent_method());

    // GET /agents/agent_1: either the agent itself or anyone who reads agents
    fx.authorizer
        .checker()
        .or("", Method::empty().with(ResourceType::Agent, "a:r"))
        .check(Some(&cred), ACCOUNT)
        .await
        .unwrap();

    // PUT /agents/agent_2 requires agent-tier update
    let err = fx
        .authorizer
        .checker()
        .or("", Method::empty().with(ResourceType::Agent, "a:u"))
        .check(Some(&cred), ACCOUNT)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::AccessDenied(Denial::NoRuleSatisfied)));
    assert_eq!(err.status_code(), 403);
}

#[tokio::test]
async fn test_self_or_admin_rule_ordering() {
    let fx = TestFixture::new().await;
    let update_agents = Method::empty().with(ResourceType::Agent, "a:u");

    // PUT /agents/agent_1: the admin passes via the second rule only if the
    // identity rule is listed after it
    let admin = fx.credential("admin", admin_method());
    fx.authorizer
        .checker()
        .or("", update_agents)
        .or("agent_1", Method::empty())
        .check(Some(&admin), ACCOUNT)
        .await
        .unwrap();

    // listed first, the identity rule rejects every other caller outright
    let err = fx
        .authorizer
        .checker()
        .or("agent_1", Method::empty())
        .or("", update_agents)
        .check(Some(&admin), ACCOUNT)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "WRONG_USER_IN_CREDENTIAL");

    let agent = fx.credential("agent_1", agent_method());
    fx.authorizer
        .checker()
        .or("agent_1", Method::empty())
        .or("", update_agents)
        .check(Some(&agent), ACCOUNT)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_narrowed_grant_revokes_stale_credential() {
    let fx = TestFixture::new().await;
    let tag_write = Method::empty().with(ResourceType::Tag, "a:cu");
    let cred = fx.credential("admin", admin_method());

    fx.authorizer
        .checker()
        .or("", tag_write)
        .check(Some(&cred), ACCOUNT)
        .await
        .unwrap();

    // admin is demoted; the issued credential still claims the old method
    fx.store.write(ACCOUNT, "admin", &agent_method()).await.unwrap();

    let err = fx
        .authorizer
        .checker()
        .or("", tag_write)
        .check(Some(&cred), ACCOUNT)
        .await
        .unwrap_err();
    assert!(err.is_denied());
}

#[tokio::test]
async fn test_credential_for_other_account() {
    let fx = TestFixture::new().await;
    let cred = Credential::new("acc_other", "admin", admin_method());

    let err = fx
        .authorizer
        .checker()
        .or("", Method::empty())
        .check(Some(&cred), ACCOUNT)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "WRONG_ACCOUNT_IN_CREDENTIAL");
}

#[tokio::test]
async fn test_single_resource_checks() {
    let fx = TestFixture::new().await;
    let cred = fx.credential("agent_1", agent_method());
    let conv = ResourceType::Conversation;

    // update a conversation assigned to me
    fx.authorizer
        .check_perm(Some(&cred), ACCOUNT, conv, Action::Update.bit(), true, false)
        .await
        .unwrap();

    // update someone else's: the ceiling allows it, the grant does not
    let err = fx
        .authorizer
        .check_perm(Some(&cred), ACCOUNT, conv, Action::Update.bit(), false, true)
        .await
        .unwrap_err();
    match err {
        AuthError::AccessDenied(Denial::Permission(e)) => {
            assert!(!e.is_prohibited());
        }
        other => panic!("unexpected error: {other}"),
    }

    // nobody may create an agent profile for themselves
    let err = fx
        .authorizer
        .check_perm(
            Some(&cred),
            ACCOUNT,
            ResourceType::Agent,
            Action::Create.bit(),
            true,
            false,
        )
        .await
        .unwrap_err();
    match err {
        AuthError::AccessDenied(Denial::Permission(e)) => {
            assert!(e.is_prohibited());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_admin_lists_identities_that_pass_a_rule() {
    let fx = TestFixture::new().await;
    let read_tags = Method::empty().with(ResourceType::Tag, "a:r");

    fx.store.set_enabled(ACCOUNT, "agent_2", false).await.unwrap();

    let ids = fx
        .store
        .list_identities_by_method(ACCOUNT, &read_tags, "", 10)
        .await
        .unwrap();
    assert_eq!(ids, vec!["admin".to_string(), "agent_1".to_string()]);

    // a disabled identity keeps its grant and still passes the checker;
    // disabling only hides it from listings
    let cred = fx.credential("agent_2", agent_method());
    fx.authorizer
        .checker()
        .or("", read_tags)
        .check(Some(&cred), ACCOUNT)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_granting_with_tiers_and_actions() {
    let fx = TestFixture::new().await;
    let mut method = Method::empty();
    method.grant(ResourceType::Pipeline, Tier::Agent, &[Action::Read, Action::Update]);
    fx.store.write(ACCOUNT, "agent_3", &method).await.unwrap();

    let cred = fx.credential("agent_3", method);
    fx.authorizer
        .checker()
        .or("", Method::empty().with(ResourceType::Pipeline, "a:ru"))
        .check(Some(&cred), ACCOUNT)
        .await
        .unwrap();
}

/// Store that never answers in time.
struct SlowStore;

#[async_trait]
impl PermissionStore for SlowStore {
    async fn write(&self, _: &str, _: &str, _: &Method) -> StoreResult<()> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    }

    async fn read(&self, _: &str, _: &str) -> StoreResult<Method> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Method::empty())
    }

    async fn set_enabled(&self, _: &str, _: &str, _: bool) -> StoreResult<()> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    }

    async fn list_identities_by_method(
        &self,
        _: &str,
        _: &Method,
        _: &str,
        _: usize,
    ) -> StoreResult<Vec<String>> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Vec::new())
    }
}

/// Store whose backend is unreachable.
struct DownStore;

#[async_trait]
impl PermissionStore for DownStore {
    async fn write(&self, _: &str, _: &str, _: &Method) -> StoreResult<()> {
        Err(StoreError::ConnectionError("connection refused".to_string()))
    }

    async fn read(&self, _: &str, _: &str) -> StoreResult<Method> {
        Err(StoreError::ConnectionError("connection refused".to_string()))
    }

    async fn set_enabled(&self, _: &str, _: &str, _: bool) -> StoreResult<()> {
        Err(StoreError::ConnectionError("connection refused".to_string()))
    }

    async fn list_identities_by_method(
        &self,
        _: &str,
        _: &Method,
        _: &str,
        _: usize,
    ) -> StoreResult<Vec<String>> {
        Err(StoreError::ConnectionError("connection refused".to_string()))
    }
}

#[tokio::test(start_paused = true)]
async fn test_slow_store_times_out() {
    let store = TimeoutStore::new(SlowStore, Duration::from_millis(200));
    let authorizer = Authorizer::new(Arc::new(store));
    let cred = Credential::new(ACCOUNT, "agent_1", agent_method());

    let err = authorizer
        .checker()
        .or("", Method::empty())
        .check(Some(&cred), ACCOUNT)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Store(StoreError::Timeout(_))));
    assert!(err.is_server_error());
    assert_eq!(err.status_code(), 503);
}

#[tokio::test]
async fn test_store_down_is_not_a_denial() {
    let authorizer = Authorizer::new(Arc::new(DownStore));
    let cred = Credential::new(ACCOUNT, "agent_1", agent_method());

    let err = authorizer
        .checker()
        .or("", Method::empty())
        .check(Some(&cred), ACCOUNT)
        .await
        .unwrap_err();
    assert!(!err.is_denied());
    assert_eq!(err.error_code(), "STORE_UNAVAILABLE");

    // credential validation happens before the store is consulted
    let err = authorizer
        .checker()
        .or("", Method::empty())
        .check(None, ACCOUNT)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredential));
}

#[tokio::test]
async fn test_authorizer_from_env_style_config() {
    let config = StoreConfig::from_lookup(|key: &str| match key {
        "PERM_STORE_BACKEND" => Some("memory".to_string()),
        "PERM_STORE_TIMEOUT_MS" => Some("500".to_string()),
        _ => None,
    })
    .unwrap();

    let authorizer = Authorizer::from_config(&config).await.unwrap();
    authorizer
        .store()
        .write(ACCOUNT, "agent_1", &agent_method())
        .await
        .unwrap();

    let cred = Credential::new(ACCOUNT, "agent_1", agent_method());
    authorizer
        .checker()
        .or("", Method::empty().with(ResourceType::Tag, "a:r"))
        .check(Some(&cred), ACCOUNT)
        .await
        .unwrap();
}
