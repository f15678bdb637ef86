//! Credential checker
//!
//! A [`Checker`] collects OR-ed admission rules and evaluates a credential
//! against them exactly once:
//!
//! ```text
//! Authorizer::checker()          building: rules added, no I/O
//!     .or(identity, method)
//!     .or("", method)
//!     .check(credential, account) evaluated: checker consumed
//! ```
//!
//! The effective capability of a caller is the intersection of what its
//! credential claims and what the store holds for its issuer, so neither a
//! forged claim nor a stale claim can exceed the real grant.

use std::sync::Arc;

use perm_rbac::{check_perm, Method, ResourceType, Tier, BASE};
use perm_store::{PermissionStore, StoreConfig, StoreResult};

use crate::credential::Credential;
use crate::error::{AuthError, AuthResult, Denial};

/// One OR-branch of a checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Identity the credential must be issued to, if any
    pub identity: Option<String>,
    /// Capabilities the caller must hold
    pub method: Method,
}

/// Creates checkers bound to a permission store.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use perm_auth::{Authorizer, Credential};
/// use perm_rbac::{Method, ResourceType};
/// use perm_store::{MemoryPermissionStore, PermissionStore};
///
/// # async fn example() -> Result<(), perm_auth::AuthError> {
/// let store = Arc::new(MemoryPermissionStore::new());
/// let agent_reader = Method::empty().with(ResourceType::Agent, "a:r");
/// store.write("acc_1", "agent_1", &agent_reader).await?;
///
/// let authorizer = Authorizer::new(store);
/// let cred = Credential::new("acc_1", "agent_1", agent_reader);
///
/// authorizer
///     .checker()
///     .or("", agent_reader)
///     .check(Some(&cred), "acc_1")
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Authorizer {
    store: Arc<dyn PermissionStore>,
}

impl std::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorizer").finish_non_exhaustive()
    }
}

impl Authorizer {
    /// Create an authorizer over a store.
    pub fn new(store: Arc<dyn PermissionStore>) -> Self {
        Self { store }
    }

    /// Open the store described by `config` and wrap it.
    pub async fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        Ok(Self::new(config.connect().await?))
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn PermissionStore> {
        &self.store
    }

    /// Start a new decision.
    pub fn checker(&self) -> Checker {
        Checker::new(self.store.clone())
    }

    /// Decide a single CRUD request on one resource.
    ///
    /// The credential is validated like [`Checker::check`]; the effective
    /// method is then tested with [`check_perm`] against the [`BASE`]
    /// ceiling on the tier picked by `is_mine` / `is_account_scoped`.
    pub async fn check_perm(
        &self,
        credential: Option<&Credential>,
        account_id: &str,
        resource: ResourceType,
        required: u16,
        is_mine: bool,
        is_account_scoped: bool,
    ) -> AuthResult<()> {
        let (credential, effective) = effective_method(&*self.store, credential, account_id).await?;
        let tier = Tier::select(is_mine, is_account_scoped);

        check_perm(required, BASE.get(resource), effective.get(resource), tier).map_err(|e| {
            tracing::debug!(
                account_id = %credential.account_id,
                issuer = %credential.issuer,
                resource = %resource,
                error = %e,
                "Permission denied"
            );
            AuthError::from(e)
        })
    }
}

/// Rule collector and evaluator for one authorization decision.
///
/// Rules are OR-ed: the first satisfied rule allows the request. A rule that
/// names an identity other than the credential's issuer aborts the whole
/// decision with [`AuthError::WrongIdentity`] instead of being skipped, even
/// when a later rule would match.
pub struct Checker {
    rules: Vec<Rule>,
    store: Arc<dyn PermissionStore>,
}

impl std::fmt::Debug for Checker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checker")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl Checker {
    /// Create a checker with no rules.
    pub fn new(store: Arc<dyn PermissionStore>) -> Self {
        Self {
            rules: Vec::new(),
            store,
        }
    }

    /// Add a rule. An empty `identity` places no constraint on the issuer.
    pub fn or(mut self, identity: impl Into<String>, method: Method) -> Self {
        let identity = identity.into();
        self.rules.push(Rule {
            identity: (!identity.is_empty()).then_some(identity),
            method,
        });
        self
    }

    /// Rules collected so far, in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Evaluate the rules against a credential.
    ///
    /// `account_id` is the account the caller claims to act in; pass an
    /// empty string to accept the credential's own account.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCredential`] if the credential is missing or
    ///   has no account or issuer
    /// - [`AuthError::WrongAccount`] if `account_id` differs from the
    ///   credential's account
    /// - [`AuthError::Store`] if the stored grant cannot be read
    /// - [`AuthError::WrongIdentity`] if a rule reached before any satisfied
    ///   one names another identity
    /// - [`AuthError::AccessDenied`] if no rule is satisfied
    pub async fn check(self, credential: Option<&Credential>, account_id: &str) -> AuthResult<()> {
        let (credential, effective) = effective_method(&*self.store, credential, account_id).await?;

        for (index, rule) in self.rules.iter().enumerate() {
            if let Some(identity) = &rule.identity {
                if identity != &credential.issuer {
                    tracing::debug!(
                        account_id = %credential.account_id,
                        issuer = %credential.issuer,
                        expected = %identity,
                        rule = index,
                        "Rule identity mismatch"
                    );
                    return Err(AuthError::WrongIdentity {
                        expected: identity.clone(),
                        issuer: credential.issuer.clone(),
                    });
                }
            }

            if effective.satisfies(&rule.method) {
                tracing::debug!(
                    account_id = %credential.account_id,
                    issuer = %credential.issuer,
                    rule = index,
                    "Access granted"
                );
                return Ok(());
            }
        }

        tracing::debug!(
            account_id = %credential.account_id,
            issuer = %credential.issuer,
            rules = self.rules.len(),
            "Access denied"
        );
        Err(AuthError::AccessDenied(Denial::NoRuleSatisfied))
    }
}

/// Validate a credential and compute what it may actually do.
async fn effective_method<'c>(
    store: &dyn PermissionStore,
    credential: Option<&'c Credential>,
    account_id: &str,
) -> AuthResult<(&'c Credential, Method)> {
    let credential = match credential {
        Some(c) if c.is_complete() => c,
        _ => return Err(AuthError::InvalidCredential),
    };

    if !account_id.is_empty() && credential.account_id != account_id {
        return Err(AuthError::WrongAccount {
            expected: account_id.to_string(),
            actual: credential.account_id.clone(),
        });
    }

    let stored = store
        .read(&credential.account_id, &credential.issuer)
        .await
        .map_err(|e| {
            tracing::warn!(
                account_id = %credential.account_id,
                issuer = %credential.issuer,
                error = %e,
                "Failed to read stored permission"
            );
            AuthError::Store(e)
        })?;

    Ok((credential, credential.method.intersect(&stored)))
}
