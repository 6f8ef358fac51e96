//! Policy storage.
//!
//! Domain services own the policy lifecycle: a policy is created empty with
//! its entity, replaced wholesale after composition, and removed with its
//! owner. The store interface is deliberately narrow; nothing here edits a
//! persisted rule list in place.

use dashmap::DashMap;
use tracing::{debug, warn};
use warden_core::{PolicyError, PolicyId, Result};

use crate::config::AuthorizationConfig;
use crate::model::Policy;

/// Cascades touching more policies than this log a warning; re-running an
/// inheritance cascade over a large subtree is usually a sign of an
/// over-broad re-parent operation.
const SAVE_ALL_WARN_THRESHOLD: usize = 500;

/// Storage for authorization policies.
pub trait PolicyStore: Send + Sync {
    /// Fetch a policy by id; a missing row is an error, not an empty policy.
    fn get(&self, id: PolicyId) -> Result<Policy>;

    /// Insert or wholesale-replace one policy.
    fn save(&self, policy: Policy) -> Result<()>;

    /// Persist a batch of policies, chunked to bound statement size.
    fn save_all(&self, policies: Vec<Policy>) -> Result<()>;

    /// Remove a policy (called when its owning entity is destroyed).
    fn remove(&self, id: PolicyId) -> Result<()>;
}

/// In-memory policy store; the reference implementation and test double.
pub struct InMemoryPolicyStore {
    policies: DashMap<PolicyId, Policy>,
    chunk_size: usize,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::with_config(&AuthorizationConfig::default())
    }

    pub fn with_config(config: &AuthorizationConfig) -> Self {
        Self {
            policies: DashMap::new(),
            chunk_size: config.save_chunk_size,
        }
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl Default for InMemoryPolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyStore for InMemoryPolicyStore {
    fn get(&self, id: PolicyId) -> Result<Policy> {
        match self.policies.get(&id) {
            Some(policy) => Ok(policy.clone()),
            None => Err(PolicyError::NotFound(id).into()),
        }
    }

    fn save(&self, policy: Policy) -> Result<()> {
        self.policies.insert(policy.id, policy);
        Ok(())
    }

    fn save_all(&self, policies: Vec<Policy>) -> Result<()> {
        if policies.len() > SAVE_ALL_WARN_THRESHOLD {
            warn!(
                count = policies.len(),
                "saving an unusually large authorization cascade"
            );
        }
        for chunk in policies.chunks(self.chunk_size.max(1)) {
            debug!(chunk = chunk.len(), "persisting policy chunk");
            for policy in chunk {
                self.policies.insert(policy.id, policy.clone());
            }
        }
        Ok(())
    }

    fn remove(&self, id: PolicyId) -> Result<()> {
        self.policies.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CredentialRule, PolicyType};
    use warden_core::privilege::privileges;
    use warden_core::{Error, Privilege};

    #[test]
    fn test_save_and_get() {
        let store = InMemoryPolicyStore::new();
        let policy = Policy::empty(PolicyType::Space);
        let id = policy.id;

        store.save(policy.clone()).unwrap();
        assert_eq!(store.get(id).unwrap(), policy);
    }

    #[test]
    fn test_get_missing_policy_is_an_error() {
        let store = InMemoryPolicyStore::new();
        let id = PolicyId::new();
        assert!(matches!(
            store.get(id),
            Err(Error::Policy(PolicyError::NotFound(missing))) if missing == id
        ));
    }

    #[test]
    fn test_save_replaces_wholesale() {
        let store = InMemoryPolicyStore::new();
        let mut policy = Policy::empty(PolicyType::Space);
        store.save(policy.clone()).unwrap();

        policy.credential_rules.push(CredentialRule::new(
            "space-member",
            "space-1",
            privileges([Privilege::Read]),
        ));
        store.save(policy.clone()).unwrap();

        let stored = store.get(policy.id).unwrap();
        assert_eq!(stored.credential_rules.len(), 1);
    }

    #[test]
    fn test_save_all_preserves_every_policy() {
        let config = AuthorizationConfig {
            save_chunk_size: 3,
            ..AuthorizationConfig::default()
        };
        let store = InMemoryPolicyStore::with_config(&config);

        let policies: Vec<Policy> = (0..10)
            .map(|_| Policy::empty(PolicyType::Contribution))
            .collect();
        let ids: Vec<PolicyId> = policies.iter().map(|p| p.id).collect();

        store.save_all(policies).unwrap();

        assert_eq!(store.len(), 10);
        for id in ids {
            assert!(store.get(id).is_ok());
        }
    }

    #[test]
    fn test_remove() {
        let store = InMemoryPolicyStore::new();
        let policy = Policy::empty(PolicyType::Space);
        let id = policy.id;
        store.save(policy).unwrap();

        store.remove(id).unwrap();
        assert!(store.get(id).is_err());
        assert!(store.is_empty());
    }
}
