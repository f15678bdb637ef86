//! # Permissions
//!
//! The [`Method`] capability set and the algebra over it: merge, intersect,
//! satisfaction and the single-resource [`check_perm`] decision.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::actions::Action;
use crate::codec::{decode, encode, MAX_PERM};
use crate::error::{PermissionError, PermissionResult};
use crate::resources::ResourceType;
use crate::tiers::Tier;

/// The biggest permission that is valid for each resource type.
///
/// Requests are clamped to this ceiling before the caller's grant is
/// consulted, and mis-granted permissions can be repaired with
/// [`Method::clamp_to_base`].
pub const BASE: Method = Method::base();

/// A capability set across every resource type.
///
/// Each resource type carries a 12-bit value (see [`Tier`]). A `Method` is
/// either a grant read from the permission store or a claim carried by a
/// credential.
///
/// # Example
///
/// ```
/// use perm_rbac::{Action, Method, ResourceType, Tier};
///
/// let mut have = Method::empty();
/// have.grant(ResourceType::Agent, Tier::Agent, &[Action::Read, Action::Update]);
///
/// let need = Method::empty().with(ResourceType::Agent, "a:r");
/// assert!(have.satisfies(&need));
/// assert!(!need.satisfies(&have));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, u16>", into = "BTreeMap<String, u16>")]
pub struct Method {
    perms: [u16; ResourceType::COUNT],
}

impl Method {
    /// A method that grants nothing.
    pub const fn empty() -> Self {
        Self {
            perms: [0; ResourceType::COUNT],
        }
    }

    /// Build a method from `(resource, spec string)` pairs. Resources not
    /// listed get no permission; a resource listed twice keeps the last spec.
    pub const fn from_specs(specs: &[(ResourceType, &str)]) -> Self {
        let mut perms = [0u16; ResourceType::COUNT];
        let mut i = 0;
        while i < specs.len() {
            let (resource, spec) = specs[i];
            perms[resource.index()] = decode(spec);
            i += 1;
        }
        Self { perms }
    }

    /// Returns a copy of the [`BASE`] ceiling.
    pub const fn base() -> Self {
        use ResourceType::*;
        Self::from_specs(&[
            (Account, "o:-r-- u:---- a:cru- s:cru-"),
            (Agent, "o:-r-- u:-ru- a:crud s:-r-d"),
            (AgentPassword, "o:---- u:cru- a:c-u- s:cru-"),
            (Permission, "o:---- u:-r-- a:-ru- s:-ru-"),
            (AgentGroup, "o:---- u:---- a:crud s:-r--"),
            (Segmentation, "o:---- u:crud a:crud s:-r--"),
            (Client, "o:---- u:---- a:---- s:-r--"),
            (Rule, "o:---- u:---- a:crud s:-r--"),
            (Conversation, "o:---- u:cru- a:-ru- s:cr--"),
            (Integration, "o:---- u:---- a:crud s:cr--"),
            (CannedResponse, "o:---- u:crud a:crud s:cr--"),
            (Tag, "o:---- u:---- a:crud s:cr--"),
            (WhitelistIp, "o:---- u:---- a:crud s:cr--"),
            (WhitelistUser, "o:---- u:---- a:crud s:cr--"),
            (WhitelistDomain, "o:---- u:---- a:crud s:cr--"),
            (Widget, "o:---- u:---- a:cru- s:cr--"),
            (Subscription, "o:---- u:---- a:cru- s:crud"),
            (Invoice, "o:---- u:---- a:-r-- s:cru-"),
            (PaymentMethod, "o:---- u:---- a:crud s:cru-"),
            (Bill, "o:---- u:---- a:-r-- s:cru-"),
            (PaymentLog, "o:---- u:---- a:-r-- s:-r--"),
            (PaymentComment, "o:---- u:---- a:---- s:cr--"),
            (User, "o:---- u:crud a:crud s:cru-"),
            (Automation, "o:-r-- u:---- a:crud s:cr--"),
            (Ping, "o:---- u:crud a:crud s:----"),
            (Attribute, "o:---- u:---- a:crud s:-r--"),
            (AgentNotification, "o:---- u:crud a:---- s:-r--"),
            (ConversationExport, "o:---- u:---- a:c--- s:----"),
            (ConversationReport, "o:---- u:---- a:-r-- s:-r--"),
            (Content, "o:-ru- u:---- a:crud s:-r--"),
            (Pipeline, "o:---- u:---- a:crud s:-r--"),
            (Currency, "o:---- u:---- a:crud s:-r--"),
            (ServiceLevelAgreement, "o:---- u:---- a:crud s:-r--"),
            (MessageTemplate, "o:---- u:crud a:crud s:-r--"),
        ])
    }

    /// Packed permission for one resource type.
    pub fn get(&self, resource: ResourceType) -> u16 {
        self.perms[resource.index()]
    }

    /// The 4 CRUD bits of one tier of one resource type.
    pub fn tier(&self, resource: ResourceType, tier: Tier) -> u16 {
        tier.extract(self.get(resource))
    }

    /// Replace the permission of one resource type. Bits above
    /// [`MAX_PERM`] are dropped.
    pub fn set(&mut self, resource: ResourceType, perm: u16) {
        self.perms[resource.index()] = perm & MAX_PERM;
    }

    /// Builder form of [`Method::set`] taking a spec string.
    pub fn with(mut self, resource: ResourceType, spec: &str) -> Self {
        self.set(resource, decode(spec));
        self
    }

    /// Add actions on one tier of a resource, keeping what is already there.
    pub fn grant(&mut self, resource: ResourceType, tier: Tier, actions: &[Action]) {
        let added = tier.place(Action::flags(actions));
        self.perms[resource.index()] |= added;
    }

    /// Union of two methods.
    pub fn merge(&self, other: &Method) -> Method {
        self.zip_with(other, |a, b| a | b)
    }

    /// Capabilities held by both methods.
    pub fn intersect(&self, other: &Method) -> Method {
        self.zip_with(other, |a, b| a & b)
    }

    /// Whether every bit of `need`, on every resource type, is present here.
    pub fn satisfies(&self, need: &Method) -> bool {
        ResourceType::ALL.iter().all(|r| {
            let bits = need.get(*r);
            bits & self.get(*r) == bits
        })
    }

    /// Drop every bit that exceeds the [`BASE`] ceiling.
    pub fn clamp_to_base(&self) -> Method {
        self.intersect(&BASE)
    }

    /// Whether no resource type has any bit set.
    pub fn is_empty(&self) -> bool {
        self.perms.iter().all(|p| *p == 0)
    }

    /// Resource types with a non-zero permission, in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceType, u16)> + '_ {
        ResourceType::ALL
            .into_iter()
            .map(|r| (r, self.get(r)))
            .filter(|(_, p)| *p != 0)
    }

    /// Check a single request against this method, using [`BASE`] as the
    /// ceiling for `resource`.
    ///
    /// ```
    /// use perm_rbac::{Method, ResourceType, Tier};
    ///
    /// let grant = Method::empty().with(ResourceType::Tag, "a:cr s:r");
    /// assert!(grant.check(ResourceType::Tag, 0x4, Tier::Agent).is_ok());
    /// assert!(grant.check(ResourceType::Tag, 0x1, Tier::Agent).is_err());
    /// ```
    pub fn check(&self, resource: ResourceType, required: u16, tier: Tier) -> PermissionResult<()> {
        check_perm(required, BASE.get(resource), self.get(resource), tier)
    }

    fn zip_with(&self, other: &Method, op: impl Fn(u16, u16) -> u16) -> Method {
        let mut out = Method::empty();
        for resource in ResourceType::ALL {
            let i = resource.index();
            out.perms[i] = op(self.perms[i], other.perms[i]);
        }
        out
    }
}

impl Default for Method {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(r, p)| (r.as_str(), encode(p))))
            .finish()
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (resource, perm) in self.iter() {
            writeln!(f, "{:<24}{}", resource.as_str(), encode(perm))?;
        }
        Ok(())
    }
}

impl FromIterator<(ResourceType, u16)> for Method {
    fn from_iter<T: IntoIterator<Item = (ResourceType, u16)>>(iter: T) -> Self {
        let mut method = Method::empty();
        for (resource, perm) in iter {
            method.set(resource, perm);
        }
        method
    }
}

// Unknown resource names are skipped so records written by a newer table
// still load.
impl From<BTreeMap<String, u16>> for Method {
    fn from(map: BTreeMap<String, u16>) -> Self {
        map.into_iter()
            .filter_map(|(name, perm)| ResourceType::parse(&name).map(|r| (r, perm)))
            .collect()
    }
}

impl From<Method> for BTreeMap<String, u16> {
    fn from(method: Method) -> Self {
        method
            .iter()
            .map(|(r, p)| (r.as_str().to_string(), p))
            .collect()
    }
}

/// Union of two optional methods. A missing side counts as empty.
pub fn merge(a: Option<&Method>, b: Option<&Method>) -> Method {
    let empty = Method::empty();
    a.unwrap_or(&empty).merge(b.unwrap_or(&empty))
}

/// Decide a single request on one resource.
///
/// `required` holds CRUD flags for one tier. `base` and `granted` are full
/// 12-bit values for the resource: the ceiling and the caller's grant. The
/// request is first validated against the ceiling (is the action legal on
/// this tier at all), then clamped to it and compared with the caller's
/// grant.
///
/// # Example
///
/// ```
/// use perm_rbac::{check_perm, codec::decode, PermissionError, Tier};
///
/// let base = decode("u:---- a:cru- s:cru-");
/// let granted = decode("a:r");
///
/// assert!(check_perm(0x4, base, granted, Tier::Agent).is_ok());
/// assert!(matches!(
///     check_perm(0x4, base, granted, Tier::User),
///     Err(PermissionError::Prohibited { .. })
/// ));
/// assert!(matches!(
///     check_perm(0x2, base, granted, Tier::Agent),
///     Err(PermissionError::Insufficient { .. })
/// ));
/// ```
pub fn check_perm(required: u16, base: u16, granted: u16, tier: Tier) -> PermissionResult<()> {
    let allowed = tier.extract(base);
    let held = tier.extract(granted);

    if required & allowed == 0 {
        return Err(PermissionError::Prohibited {
            required,
            allowed,
            tier,
        });
    }

    let required = required & allowed;
    if required & held != required {
        return Err(PermissionError::Insufficient {
            required,
            granted: held,
            tier,
        });
    }

    Ok(())
}
