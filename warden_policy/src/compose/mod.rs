//! Policy composition: building and merging policies during entity creation
//! and re-parenting.
//!
//! All composition is append-only. Rules are never deduplicated and never
//! removed one by one; a policy is replaced wholesale or destroyed with its
//! owner. Running the inheritance cascade twice with the same parent
//! therefore duplicates the parent-derived rules — preserved behavior, see
//! the tests.

use tracing::debug;
use warden_core::privilege::privileges;
use warden_core::{
    ActorId, CredentialCriteria, Error, PolicyError, Privilege, PrivilegeSet, Result,
};

use crate::model::{CredentialRule, Policy, PolicyType, PrivilegeRule, VerifiedCredentialRule};

/// Credential type asserting that an actor manages their own profile; used
/// to scope self-service rules to exactly one actor.
pub const CREDENTIAL_TYPE_SELF_MANAGEMENT: &str = "actor-self-management";

/// Platform-global roles that composition can grant privileges to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlobalRole {
    Admin,
    Support,
    Registered,
    Anonymous,
}

impl GlobalRole {
    /// The credential type actors holding this role carry.
    pub fn credential_type(&self) -> &'static str {
        match self {
            GlobalRole::Admin => "global-admin",
            GlobalRole::Support => "global-support",
            GlobalRole::Registered => "global-registered",
            GlobalRole::Anonymous => "global-anonymous",
        }
    }
}

/// Builds and merges authorization policies.
#[derive(Clone, Copy, Debug, Default)]
pub struct PolicyComposer;

impl PolicyComposer {
    pub fn new() -> Self {
        Self
    }

    /// Cascade a parent's authorization onto a child.
    ///
    /// The child's visibility gate is overridden by the parent's (a child
    /// can never be more visible than its parent), and the parent's
    /// credential and verified-credential rules are appended onto the
    /// child's existing rule lists — no replacement, no deduplication.
    pub fn inherit_parent_authorization(&self, child: &mut Policy, parent: &Policy) {
        child.anonymous_read_access = parent.anonymous_read_access;
        child
            .credential_rules
            .extend(parent.credential_rules.iter().cloned());
        child
            .verified_credential_rules
            .extend(parent.verified_credential_rules.iter().cloned());
        debug!(
            child = %child.id,
            parent = %parent.id,
            rules = child.rule_count(),
            "inherited parent authorization"
        );
    }

    /// Append one rule built from matching criteria. Not idempotent by
    /// design: appending twice grants twice.
    pub fn append_credential_authorization_rule(
        &self,
        policy: &mut Policy,
        criteria: &CredentialCriteria,
        granted_privileges: PrivilegeSet,
    ) -> Result<()> {
        if criteria.credential_type.is_empty() {
            return Err(Error::from(PolicyError::InvalidRule(
                "credential rule with empty credential type can never match".to_string(),
            )));
        }
        policy
            .credential_rules
            .push(CredentialRule::from_criteria(criteria, granted_privileges));
        Ok(())
    }

    /// Append a batch of credential rules.
    pub fn append_credential_authorization_rules(
        &self,
        policy: &mut Policy,
        rules: Vec<CredentialRule>,
    ) {
        policy.credential_rules.extend(rules);
    }

    /// Append a batch of verified-credential rules.
    pub fn append_verified_credential_authorization_rules(
        &self,
        policy: &mut Policy,
        rules: Vec<VerifiedCredentialRule>,
    ) {
        policy.verified_credential_rules.extend(rules);
    }

    /// Append a privilege-to-privilege mapping.
    pub fn append_privilege_authorization_rule(
        &self,
        policy: &mut Policy,
        source_privilege: Privilege,
        granted_privileges: PrivilegeSet,
    ) {
        policy
            .privilege_rules
            .push(PrivilegeRule::new(source_privilege, granted_privileges));
    }

    /// A transient clone of `policy` that additionally lets exactly one
    /// actor exercise `Grant`, so an actor can remove themselves from a role
    /// without holding a generic grant privilege.
    ///
    /// The clone must never be written back to storage; it exists only for
    /// the duration of the one check.
    pub fn extend_authorization_policy_for_self_removal(
        &self,
        policy: &Policy,
        actor_id: ActorId,
    ) -> Policy {
        let mut extended = self.clone_policy(policy);
        extended.credential_rules.push(CredentialRule::new(
            CREDENTIAL_TYPE_SELF_MANAGEMENT,
            actor_id.to_string(),
            privileges([Privilege::Grant]),
        ));
        extended
    }

    /// Clear all rule lists, keeping id, type, and visibility gate.
    ///
    /// Domain services run this before re-running an inheritance cascade
    /// from scratch.
    pub fn reset(&self, policy: &mut Policy) {
        policy.credential_rules.clear();
        policy.verified_credential_rules.clear();
        policy.privilege_rules.clear();
    }

    /// Deep copy of a policy, sharing nothing with the original.
    pub fn clone_policy(&self, policy: &Policy) -> Policy {
        policy.clone()
    }

    /// Build wildcard rules granting `privileges` to each global role.
    pub fn global_role_rules(
        &self,
        roles: &[GlobalRole],
        granted_privileges: &PrivilegeSet,
    ) -> Vec<CredentialRule> {
        roles
            .iter()
            .map(|role| {
                CredentialRule::new(role.credential_type(), "", granted_privileges.clone())
            })
            .collect()
    }

    /// A transient in-memory policy granting `privileges` to the given
    /// global roles; used for platform-level checks with no owning entity.
    pub fn create_global_roles_policy(
        &self,
        roles: &[GlobalRole],
        granted_privileges: &PrivilegeSet,
    ) -> Policy {
        let mut policy = Policy::empty(PolicyType::InMemory);
        self.append_credential_authorization_rules(
            &mut policy,
            self.global_role_rules(roles, granted_privileges),
        );
        policy
    }
}
