//! The policy model: the persisted rule set attached to every governed
//! entity.

mod rule;
mod serialize;

pub use rule::{CredentialRule, PrivilegeRule, VerifiedCredentialRule};
pub use serialize::{
    deserialize_credential_rules, deserialize_privilege_rules, serialize_credential_rules,
    serialize_privilege_rules, PolicyRecord,
};

use serde::{Deserialize, Serialize};
use warden_core::PolicyId;

/// The kind of entity a policy governs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyType {
    Space,
    Collaboration,
    Callout,
    Contribution,
    RoleSet,
    /// Transient policies that are never persisted (e.g. global-role checks).
    InMemory,
    Unknown,
}

/// The authorization policy of one governed entity.
///
/// Exactly one policy exists per entity (1:1, owned by the entity and
/// destroyed with it). A policy with zero rules and
/// `anonymous_read_access = false` grants nothing; an *absent* policy is a
/// distinct fail-closed error condition, never "zero rules".
#[derive(Clone, Debug, PartialEq)]
pub struct Policy {
    pub id: PolicyId,

    /// Ordered rules matched against the actor's held credentials.
    pub credential_rules: Vec<CredentialRule>,

    /// Ordered rules matched against the actor's verified claims.
    pub verified_credential_rules: Vec<VerifiedCredentialRule>,

    /// Privilege-to-privilege mappings, expanded after credential matching.
    pub privilege_rules: Vec<PrivilegeRule>,

    /// Visibility gate: when set, `Read` is granted to every actor.
    pub anonymous_read_access: bool,

    pub policy_type: PolicyType,
}

impl Policy {
    /// Create the empty policy that accompanies a freshly created entity.
    ///
    /// The composer populates it on creation and on every re-parent
    /// operation.
    pub fn empty(policy_type: PolicyType) -> Self {
        Self {
            id: PolicyId::new(),
            credential_rules: Vec::new(),
            verified_credential_rules: Vec::new(),
            privilege_rules: Vec::new(),
            anonymous_read_access: false,
            policy_type,
        }
    }

    /// Total number of rules across all rule lists.
    pub fn rule_count(&self) -> usize {
        self.credential_rules.len()
            + self.verified_credential_rules.len()
            + self.privilege_rules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_policy_has_no_rules() {
        let policy = Policy::empty(PolicyType::Space);
        assert_eq!(policy.rule_count(), 0);
        assert!(!policy.anonymous_read_access);
        assert_eq!(policy.policy_type, PolicyType::Space);
    }

    #[test]
    fn test_empty_policies_get_distinct_ids() {
        let a = Policy::empty(PolicyType::Callout);
        let b = Policy::empty(PolicyType::Callout);
        assert_ne!(a.id, b.id);
    }
}
