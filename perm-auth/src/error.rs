//! Error types for authorization decisions
//!
//! Every failed decision is one of these variants, returned to the caller of
//! [`Checker::check`](crate::Checker::check). Nothing is retried internally.

use perm_rbac::PermissionError;
use perm_store::StoreError;
use thiserror::Error;

/// Authorization error types.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Credential is missing, or has no account or issuer
    #[error("Invalid credential")]
    InvalidCredential,

    /// Credential belongs to a different account than the one asserted
    #[error("Wrong account in credential: expected {expected}, got {actual}")]
    WrongAccount {
        /// Account the caller asserted
        expected: String,
        /// Account carried by the credential
        actual: String,
    },

    /// A rule demands an identity the credential was not issued to
    #[error("Wrong identity in credential: expected {expected}, got {issuer}")]
    WrongIdentity {
        /// Identity required by the rule
        expected: String,
        /// Issuer of the credential
        issuer: String,
    },

    /// The credential does not carry enough permission
    #[error("Access denied: {0}")]
    AccessDenied(Denial),

    /// The permission store could not be consulted
    #[error("Permission store unavailable: {0}")]
    Store(#[from] StoreError),
}

/// Why access was denied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Denial {
    /// No rule of the checker was satisfied (including a checker with no rules)
    #[error("no rule satisfied")]
    NoRuleSatisfied,

    /// A single-resource check failed
    #[error(transparent)]
    Permission(#[from] PermissionError),
}

/// Result type for authorization decisions.
pub type AuthResult<T> = Result<T, AuthError>;

impl From<PermissionError> for AuthError {
    fn from(e: PermissionError) -> Self {
        AuthError::AccessDenied(Denial::Permission(e))
    }
}

impl AuthError {
    /// Whether this is a decision against the caller, as opposed to a
    /// failure to reach a decision.
    pub fn is_denied(&self) -> bool {
        !matches!(self, AuthError::Store(_))
    }

    /// Check if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        matches!(self, AuthError::Store(_))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InvalidCredential => 401,
            AuthError::WrongAccount { .. }
            | AuthError::WrongIdentity { .. }
            | AuthError::AccessDenied(_) => 403,
            AuthError::Store(_) => 503,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredential => "INVALID_CREDENTIAL",
            AuthError::WrongAccount { .. } => "WRONG_ACCOUNT_IN_CREDENTIAL",
            AuthError::WrongIdentity { .. } => "WRONG_USER_IN_CREDENTIAL",
            AuthError::AccessDenied(_) => "ACCESS_DENIED",
            AuthError::Store(_) => "STORE_UNAVAILABLE",
        }
    }
}
