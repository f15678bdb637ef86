//! Error types for permission checks

use thiserror::Error;

use crate::tiers::Tier;

/// Reasons a single-resource permission check is denied.
///
/// Both variants are access denials. They stay separate so callers can tell
/// "this action does not exist for this resource" from "you cannot do it".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// None of the requested flags is legal on this resource tier.
    #[error("access to resource is prohibited: required {required:#x} on {tier} tier, allowed {allowed:#x}")]
    Prohibited {
        /// Requested CRUD flags.
        required: u16,
        /// The tier's ceiling.
        allowed: u16,
        /// Tier the request was evaluated on.
        tier: Tier,
    },

    /// The caller lacks at least one of the requested flags.
    #[error("not enough permission on {tier} tier: need {required:#x}, got {granted:#x}")]
    Insufficient {
        /// Requested CRUD flags, clamped to the ceiling.
        required: u16,
        /// The caller's flags on the tier.
        granted: u16,
        /// Tier the request was evaluated on.
        tier: Tier,
    },
}

/// Result type for permission checks.
pub type PermissionResult<T> = Result<T, PermissionError>;

impl PermissionError {
    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        "ACCESS_DENIED"
    }

    /// Whether the denial is structural, independent of the caller.
    pub fn is_prohibited(&self) -> bool {
        matches!(self, PermissionError::Prohibited { .. })
    }
}
