//! Credentials held by actors and the criteria rules match them against.

use serde::{Deserialize, Serialize};

/// A claim that an actor holds a role or relationship to a resource.
///
/// Held credentials always name a concrete resource (or the empty string for
/// platform-global credentials); wildcard semantics exist only on the
/// matching side, see [`CredentialCriteria`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// The credential type, e.g. `space-member` or `global-admin`.
    #[serde(rename = "type")]
    pub credential_type: String,

    /// The resource the credential is scoped to.
    #[serde(rename = "resourceID")]
    pub resource_id: String,
}

impl Credential {
    pub fn new(credential_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            credential_type: credential_type.into(),
            resource_id: resource_id.into(),
        }
    }

    /// A platform-global credential with no resource scope.
    pub fn global(credential_type: impl Into<String>) -> Self {
        Self::new(credential_type, "")
    }
}

/// The matching side of a credential: what a rule looks for.
///
/// An empty `resource_id` is a wildcard and matches any held credential of
/// the same type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialCriteria {
    #[serde(rename = "type")]
    pub credential_type: String,

    #[serde(rename = "resourceID")]
    pub resource_id: String,
}

impl CredentialCriteria {
    pub fn new(credential_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            credential_type: credential_type.into(),
            resource_id: resource_id.into(),
        }
    }

    /// Criteria matching any credential of the given type.
    pub fn any_resource(credential_type: impl Into<String>) -> Self {
        Self::new(credential_type, "")
    }

    /// Check whether a held credential satisfies these criteria.
    pub fn matches(&self, credential: &Credential) -> bool {
        if self.credential_type != credential.credential_type {
            return false;
        }
        self.resource_id.is_empty() || self.resource_id == credential.resource_id
    }
}
