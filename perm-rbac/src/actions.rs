//! # Actions
//!
//! The four CRUD flags packed into every permission tier.

use serde::{Deserialize, Serialize};

/// Actions that can be performed on resources.
///
/// Each action is one bit of a 4-bit tier: create(8), read(4), update(2),
/// delete(1). Actions combine by bitwise OR.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Create new resource instances.
    Create,
    /// Read/view resource data.
    Read,
    /// Modify existing resources.
    Update,
    /// Remove resources.
    Delete,
}

impl Action {
    /// All actions, highest bit first.
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    /// The bit this action occupies inside a tier.
    pub const fn bit(self) -> u16 {
        match self {
            Action::Create => 8,
            Action::Read => 4,
            Action::Update => 2,
            Action::Delete => 1,
        }
    }

    /// The letter used for this action in permission spec strings.
    pub const fn letter(self) -> char {
        match self {
            Action::Create => 'c',
            Action::Read => 'r',
            Action::Update => 'u',
            Action::Delete => 'd',
        }
    }

    /// Get the string representation of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    /// Parse action from string representation.
    ///
    /// # Example
    ///
    /// ```
    /// use perm_rbac::actions::Action;
    ///
    /// assert_eq!(Action::parse("read"), Some(Action::Read));
    /// assert_eq!(Action::parse("r"), Some(Action::Read));
    /// assert_eq!(Action::parse("remove"), Some(Action::Delete));
    /// assert_eq!(Action::parse("manage"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "create" | "c" | "add" | "new" => Some(Action::Create),
            "read" | "r" | "view" | "get" => Some(Action::Read),
            "update" | "u" | "edit" | "write" | "modify" => Some(Action::Update),
            "delete" | "d" | "remove" | "destroy" => Some(Action::Delete),
            _ => None,
        }
    }

    /// OR together the bits of several actions.
    ///
    /// ```
    /// use perm_rbac::actions::Action;
    ///
    /// assert_eq!(Action::flags(&[Action::Read, Action::Update]), 0x6);
    /// ```
    pub fn flags(actions: &[Action]) -> u16 {
        actions.iter().fold(0, |acc, a| acc | a.bit())
    }

    /// Actions whose bit is set in a 4-bit tier value.
    pub fn from_flags(flags: u16) -> Vec<Action> {
        Self::ALL
            .into_iter()
            .filter(|a| flags & a.bit() != 0)
            .collect()
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
