//! Permission tiers
//!
//! A 12-bit permission value holds three 4-bit tiers. Which tier applies to a
//! request depends on who owns the target resource.

use serde::{Deserialize, Serialize};

/// Ownership scope of the resource being accessed.
///
/// | Tier     | Letter | Bits      | Resource belongs to                     |
/// |----------|--------|-----------|-----------------------------------------|
/// | `User`   | `u`    | `[0, 4)`  | the acting identity                     |
/// | `Agent`  | `a`    | `[4, 8)`  | another identity of the same account    |
/// | `System` | `s`    | `[8, 12)` | the account as a whole                  |
///
/// Spec strings may also carry an owner tier (`o`). It has no bit range and
/// [`Tier::parse`] rejects it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Resource owned by the caller.
    User,
    /// Resource owned by another agent of the same account.
    Agent,
    /// Account-wide resource.
    System,
}

impl Tier {
    /// All tiers, lowest bits first.
    pub const ALL: [Tier; 3] = [Tier::User, Tier::Agent, Tier::System];

    /// Mask covering one tier once shifted down.
    pub const MASK: u16 = 0xF;

    /// Pick the tier for a request.
    ///
    /// `is_mine` wins over `is_account_scoped`; neither means the resource is
    /// account-wide.
    pub const fn select(is_mine: bool, is_account_scoped: bool) -> Self {
        if is_mine {
            Tier::User
        } else if is_account_scoped {
            Tier::Agent
        } else {
            Tier::System
        }
    }

    /// Bit offset of this tier inside a 12-bit permission value.
    pub const fn shift(self) -> u16 {
        match self {
            Tier::User => 0,
            Tier::Agent => 4,
            Tier::System => 8,
        }
    }

    /// The tier letter used in spec strings.
    pub const fn letter(self) -> char {
        match self {
            Tier::User => 'u',
            Tier::Agent => 'a',
            Tier::System => 's',
        }
    }

    /// Parse a tier letter (case-insensitive). Unknown letters, including
    /// the owner tier `o`, return `None`.
    pub const fn parse(letter: u8) -> Option<Self> {
        match letter.to_ascii_lowercase() {
            b'u' => Some(Tier::User),
            b'a' => Some(Tier::Agent),
            b's' => Some(Tier::System),
            _ => None,
        }
    }

    /// Extract this tier's 4 CRUD bits from a 12-bit permission value.
    ///
    /// ```
    /// use perm_rbac::Tier;
    ///
    /// assert_eq!(Tier::User.extract(0x0C4), 0x4);
    /// assert_eq!(Tier::Agent.extract(0x0C4), 0xC);
    /// assert_eq!(Tier::System.extract(0x0C4), 0x0);
    /// ```
    pub const fn extract(self, perm: u16) -> u16 {
        (perm >> self.shift()) & Self::MASK
    }

    /// Place 4 CRUD bits into this tier's position.
    pub const fn place(self, flags: u16) -> u16 {
        (flags & Self::MASK) << self.shift()
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tier::User => "user",
            Tier::Agent => "agent",
            Tier::System => "system",
        };
        f.write_str(name)
    }
}
