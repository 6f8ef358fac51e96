//! # Warden Policy
//!
//! `warden_policy` provides the authorization policy system for Warden.
//! Policies attach to every governed entity in a deep hierarchy (space,
//! collaboration, callout, contribution, ...) and decide, per actor, which
//! privileges are granted.
//!
//! Key concepts:
//!
//! 1. **Policy**: the persisted rule set and flags governing one entity.
//!
//! 2. **Evaluation**: a pure function from (actor context, policy) to the
//!    granted privilege set, with a check-or-fail guard on top.
//!
//! 3. **Composition**: building and merging policies on entity creation and
//!    re-parenting (the inheritance cascade).
//!
//! 4. **Storage**: a narrow store interface for policy lifecycle, with an
//!    in-memory reference implementation.

pub mod compose;
pub mod config;
pub mod engine;
pub mod model;
pub mod store;

// Re-export key types for convenience
pub use compose::{GlobalRole, PolicyComposer, CREDENTIAL_TYPE_SELF_MANAGEMENT};
pub use config::AuthorizationConfig;
pub use engine::{AuditLog, DenialEntry, PolicyEvaluator};
pub use model::{
    CredentialRule, Policy, PolicyRecord, PolicyType, PrivilegeRule, VerifiedCredentialRule,
};
pub use store::{InMemoryPolicyStore, PolicyStore};
