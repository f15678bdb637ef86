//! # Perm Auth
//!
//! Decides whether an authenticated caller may perform a request, given the
//! capabilities its credential claims and the grant recorded for it in a
//! [`PermissionStore`](perm_store::PermissionStore).
//!
//! ## Overview
//!
//! The perm-auth crate handles:
//! - **Credentials**: the identity and claimed method of a caller
//! - **Checker**: OR-ed admission rules evaluated once per request
//! - **Single-resource checks**: tier-aware CRUD decisions against the
//!   [`BASE`](perm_rbac::BASE) ceiling
//!
//! Token parsing and signature verification happen upstream; this crate
//! starts from an already decoded [`Credential`].
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use perm_auth::{AuthError, Authorizer, Credential};
//! use perm_rbac::{Method, ResourceType};
//! use perm_store::{MemoryPermissionStore, PermissionStore};
//!
//! # async fn example() -> Result<(), AuthError> {
//! let store = Arc::new(MemoryPermissionStore::new());
//! let tags = Method::empty().with(ResourceType::Tag, "a:cru");
//! store.write("acc_1", "agent_1", &tags).await?;
//!
//! let authorizer = Authorizer::new(store);
//! let cred = Credential::new("acc_1", "agent_1", tags);
//!
//! // Only agent_2 may pass the first rule; agent_1 is rejected outright.
//! let err = authorizer
//!     .checker()
//!     .or("agent_2", Method::empty())
//!     .or("", tags)
//!     .check(Some(&cred), "acc_1")
//!     .await
//!     .unwrap_err();
//! assert!(matches!(err, AuthError::WrongIdentity { .. }));
//!
//! // Any identity holding the tag grant passes.
//! authorizer
//!     .checker()
//!     .or("", tags)
//!     .check(Some(&cred), "acc_1")
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod checker;
pub mod credential;
pub mod error;

// Re-export main types
pub use checker::{Authorizer, Checker, Rule};
pub use credential::Credential;
pub use error::{AuthError, AuthResult, Denial};
