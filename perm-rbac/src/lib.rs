//! # Perm RBAC
//!
//! Compact per-tier CRUD permissions for multi-tenant resources.
//!
//! ## Overview
//!
//! Every resource belongs to an account. Access to a resource type is
//! described by a 12-bit value made of three 4-bit tiers:
//!
//! ```text
//!  bits   11..8     7..4     3..0
//!        system    agent     user
//!        c r u d   c r u d   c r u d
//! ```
//!
//! - **user**: the resource belongs to the acting identity
//! - **agent**: the resource belongs to another identity of the account
//! - **system**: the resource belongs to the account as a whole
//!
//! The crate handles:
//! - **Resources**: the fixed table of resource types
//! - **Actions** and **Tiers**: the CRUD flags and their bit positions
//! - **Codec**: `"u:-ru- a:crud s:-r-d"` spec strings to bits and back
//! - **Permissions**: the [`Method`] capability set, [`BASE`] ceiling and
//!   the [`check_perm`] decision
//!
//! ## Usage
//!
//! ```rust
//! use perm_rbac::{Action, Method, ResourceType, Tier, BASE};
//!
//! // What an agent was granted
//! let grant = Method::empty()
//!     .with(ResourceType::Conversation, "u:cru a:r")
//!     .with(ResourceType::Tag, "a:crud");
//!
//! // May the agent update a conversation assigned to someone else?
//! let update = Action::Update.bit();
//! assert!(grant.check(ResourceType::Conversation, update, Tier::Agent).is_err());
//!
//! // Read it?
//! assert!(grant.check(ResourceType::Conversation, Action::Read.bit(), Tier::Agent).is_ok());
//!
//! // Grants never exceed the ceiling once clamped
//! assert!(BASE.satisfies(&grant.clamp_to_base()));
//! ```

pub mod actions;
pub mod codec;
pub mod error;
pub mod permissions;
pub mod resources;
pub mod tiers;

// Re-export main types for convenience
pub use actions::Action;
pub use error::{PermissionError, PermissionResult};
pub use permissions::{check_perm, merge, Method, BASE};
pub use resources::ResourceType;
pub use tiers::Tier;
