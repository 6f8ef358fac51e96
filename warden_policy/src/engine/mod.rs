//! The policy evaluation engine.
//!
//! Evaluation is a pure function from (actor context, policy) to the granted
//! privilege set: a monotonic union over matching rules, with no subtraction
//! and no negative rules. The engine holds no mutable state and is safely
//! reentrant across concurrent requests.

mod audit;

pub use audit::{AuditLog, DenialEntry};

use tracing::warn;
use warden_core::{ActorContext, PolicyError, Privilege, PrivilegeSet, Result};

use crate::config::AuthorizationConfig;
use crate::model::Policy;

/// Computes granted privileges and enforces required ones.
#[derive(Clone, Default)]
pub struct PolicyEvaluator {
    config: AuthorizationConfig,
    audit: Option<AuditLog>,
}

impl PolicyEvaluator {
    /// An evaluator with default configuration (enforcement on).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AuthorizationConfig) -> Self {
        Self {
            config,
            audit: None,
        }
    }

    /// Record denials into the given audit log in addition to logging them.
    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Compute the full set of privileges the policy grants this actor.
    ///
    /// The union of: `Read` when the policy allows anonymous read access
    /// (granted to every actor, anonymous or not), the privileges of every
    /// credential rule matching a held credential, the privileges of every
    /// verified-credential rule matching a verified claim, and one pass of
    /// privilege-rule expansion over that union.
    pub fn compute_granted_privileges(
        &self,
        actor: &ActorContext,
        policy: &Policy,
    ) -> PrivilegeSet {
        let mut granted = PrivilegeSet::new();

        if policy.anonymous_read_access {
            granted.insert(Privilege::Read);
        }

        for rule in &policy.credential_rules {
            if actor.held_credentials.iter().any(|c| rule.matches(c)) {
                granted.extend(rule.granted_privileges.iter().copied());
            }
        }

        for rule in &policy.verified_credential_rules {
            if actor.verified_claims.iter().any(|c| rule.matches(c)) {
                granted.extend(rule.granted_privileges.iter().copied());
            }
        }

        // Single-pass expansion: mapped privileges do not trigger further
        // privilege rules.
        let base = granted.clone();
        for rule in &policy.privilege_rules {
            if base.contains(&rule.source_privilege) {
                granted.extend(rule.granted_privileges.iter().copied());
            }
        }

        granted
    }

    /// Check a single privilege without failing.
    pub fn is_access_granted(
        &self,
        actor: &ActorContext,
        policy: &Policy,
        required: Privilege,
    ) -> bool {
        if !self.config.enabled {
            return true;
        }
        self.compute_granted_privileges(actor, policy)
            .contains(&required)
    }

    /// The coarse guard: return normally when the privilege is granted,
    /// fail otherwise.
    ///
    /// An absent policy fails closed regardless of the required privilege.
    /// Denials forward `audit_context` verbatim to the log at WARN level;
    /// successes produce no log record at all, to bound log volume.
    pub fn grant_access_or_fail(
        &self,
        actor: &ActorContext,
        policy: Option<&Policy>,
        required: Privilege,
        audit_context: &str,
    ) -> Result<()> {
        let policy =
            policy.ok_or_else(|| PolicyError::Absent(audit_context.to_string()))?;

        if self.is_access_granted(actor, policy, required) {
            return Ok(());
        }

        warn!(
            actor = %actor.actor_id,
            privilege = %required,
            context = audit_context,
            "access denied"
        );
        if let Some(audit) = &self.audit {
            audit.record_denial(actor.actor_id, required, audit_context);
        }

        Err(PolicyError::Forbidden {
            required,
            context: audit_context.to_string(),
        }
        .into())
    }
}
