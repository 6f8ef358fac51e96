//! Privileges grantable on governed entities.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An atomic permitted action on a governed entity.
///
/// Privileges carry no ordering between themselves; a grant is always a set
/// of privileges and evaluation is a monotonic union over matching rules.
/// The `Ord` derive exists only so privilege sets serialize in a stable
/// order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Privilege {
    /// Create child entities under the governed entity.
    Create,

    /// Read the governed entity.
    Read,

    /// Update the governed entity.
    Update,

    /// Delete the governed entity.
    Delete,

    /// Manage grants on the governed entity (role assignment/removal).
    Grant,

    /// Contribute content to the governed entity.
    Contribute,

    /// Re-run the authorization cascade for the governed entity.
    AuthorizationReset,
}

/// A set of granted privileges.
///
/// `BTreeSet` keeps the serialized form deterministic, so a persisted rule
/// list round-trips without reordering.
pub type PrivilegeSet = BTreeSet<Privilege>;

impl Privilege {
    /// The canonical string form, as persisted in rule records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Privilege::Create => "create",
            Privilege::Read => "read",
            Privilege::Update => "update",
            Privilege::Delete => "delete",
            Privilege::Grant => "grant",
            Privilege::Contribute => "contribute",
            Privilege::AuthorizationReset => "authorization-reset",
        }
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Convenience constructor for a privilege set.
pub fn privileges<I: IntoIterator<Item = Privilege>>(items: I) -> PrivilegeSet {
    items.into_iter().collect()
}
