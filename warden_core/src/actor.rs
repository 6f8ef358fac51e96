//! The per-request actor context.

use crate::credential::Credential;
use crate::id::ActorId;

/// Who is asking.
///
/// Supplied by the authentication/session layer at request entry and threaded
/// through the call chain; never persisted by this system. The evaluation
/// engine only ever reads it, so one context can back any number of
/// concurrent checks.
#[derive(Clone, Debug)]
pub struct ActorContext {
    pub actor_id: ActorId,

    /// Credentials the actor holds (roles, memberships).
    pub held_credentials: Vec<Credential>,

    /// Claims verified by an external issuer, matched against
    /// verified-credential rules only.
    pub verified_claims: Vec<Credential>,

    pub is_anonymous: bool,
}

impl ActorContext {
    /// Context for an authenticated actor.
    pub fn authenticated(
        actor_id: ActorId,
        held_credentials: Vec<Credential>,
        verified_claims: Vec<Credential>,
    ) -> Self {
        Self {
            actor_id,
            held_credentials,
            verified_claims,
            is_anonymous: false,
        }
    }

    /// Context for an unauthenticated request: nil identity, no credentials.
    pub fn anonymous() -> Self {
        Self {
            actor_id: ActorId::nil(),
            held_credentials: Vec::new(),
            verified_claims: Vec::new(),
            is_anonymous: true,
        }
    }

    /// Check whether the actor holds a credential of the given type for the
    /// given resource.
    pub fn holds(&self, credential_type: &str, resource_id: &str) -> bool {
        self.held_credentials
            .iter()
            .any(|c| c.credential_type == credential_type && c.resource_id == resource_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_context_has_no_credentials() {
        let actor = ActorContext::anonymous();
        assert!(actor.is_anonymous);
        assert!(actor.held_credentials.is_empty());
        assert!(actor.verified_claims.is_empty());
        assert_eq!(actor.actor_id, ActorId::nil());
    }

    #[test]
    fn test_holds() {
        let actor = ActorContext::authenticated(
            ActorId::new(),
            vec![Credential::new("space-member", "space-1")],
            Vec::new(),
        );
        assert!(actor.holds("space-member", "space-1"));
        assert!(!actor.holds("space-member", "space-2"));
        assert!(!actor.holds("space-admin", "space-1"));
    }
}
