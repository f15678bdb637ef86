//! Caller credentials
//!
//! A credential is produced by the authentication layer for every request.
//! This crate only reads it: tokens are parsed and verified upstream.

use perm_rbac::Method;
use serde::{Deserialize, Serialize};

/// Identity asserted by a caller.
///
/// The claimed method is what the caller believes it holds. The checker
/// never trusts it alone; it is intersected with the grant in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Account the caller acts in
    pub account_id: String,

    /// Identity the credential was issued to
    pub issuer: String,

    /// Claimed capabilities
    #[serde(default)]
    pub method: Method,
}

impl Credential {
    /// Creates a credential.
    ///
    /// # Examples
    ///
    /// ```
    /// use perm_auth::Credential;
    /// use perm_rbac::{Method, ResourceType};
    ///
    /// let cred = Credential::new("acc_1", "agent_1", Method::empty().with(ResourceType::Agent, "a:r"));
    /// assert!(cred.is_complete());
    /// assert!(!Credential::new("", "agent_1", Method::empty()).is_complete());
    /// ```
    pub fn new(account_id: impl Into<String>, issuer: impl Into<String>, method: Method) -> Self {
        Self {
            account_id: account_id.into(),
            issuer: issuer.into(),
            method,
        }
    }

    /// Whether both the account and the issuer are present.
    ///
    /// A credential without an account is treated as no credential at all.
    pub fn is_complete(&self) -> bool {
        !self.account_id.is_empty() && !self.issuer.is_empty()
    }
}
