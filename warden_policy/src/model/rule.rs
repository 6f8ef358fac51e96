//! Rule types carried by a policy.

use serde::{Deserialize, Serialize};
use warden_core::{Credential, CredentialCriteria, Privilege, PrivilegeSet};

/// A rule granting privileges to holders of a matching credential.
///
/// An empty `resource_id` is a wildcard: the rule matches any held
/// credential of its type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRule {
    pub credential_type: String,

    #[serde(rename = "resourceID")]
    pub resource_id: String,

    pub granted_privileges: PrivilegeSet,
}

/// Structurally identical to [`CredentialRule`], but matched against the
/// actor's verified claims rather than held credentials.
pub type VerifiedCredentialRule = CredentialRule;

impl CredentialRule {
    pub fn new(
        credential_type: impl Into<String>,
        resource_id: impl Into<String>,
        granted_privileges: PrivilegeSet,
    ) -> Self {
        Self {
            credential_type: credential_type.into(),
            resource_id: resource_id.into(),
            granted_privileges,
        }
    }

    /// Build a rule from matching criteria.
    pub fn from_criteria(criteria: &CredentialCriteria, granted_privileges: PrivilegeSet) -> Self {
        Self::new(
            criteria.credential_type.clone(),
            criteria.resource_id.clone(),
            granted_privileges,
        )
    }

    /// Check whether a held credential (or verified claim) matches this
    /// rule.
    pub fn matches(&self, credential: &Credential) -> bool {
        if self.credential_type != credential.credential_type {
            return false;
        }
        self.resource_id.is_empty() || self.resource_id == credential.resource_id
    }
}

/// A privilege-to-privilege mapping: once the source privilege is granted by
/// credential matching, the mapped privileges are granted too.
///
/// Expansion is a single pass; granted privileges do not recursively trigger
/// further privilege rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivilegeRule {
    pub source_privilege: Privilege,
    pub granted_privileges: PrivilegeSet,
}

impl PrivilegeRule {
    pub fn new(source_privilege: Privilege, granted_privileges: PrivilegeSet) -> Self {
        Self {
            source_privilege,
            granted_privileges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::privilege::privileges;

    #[test]
    fn test_rule_matches_exact_resource() {
        let rule = CredentialRule::new("space-member", "space-1", privileges([Privilege::Read]));
        assert!(rule.matches(&Credential::new("space-member", "space-1")));
        assert!(!rule.matches(&Credential::new("space-member", "space-2")));
        assert!(!rule.matches(&Credential::new("space-lead", "space-1")));
    }

    #[test]
    fn test_rule_empty_resource_is_wildcard() {
        let rule = CredentialRule::new("global-admin", "", privileges([Privilege::Grant]));
        assert!(rule.matches(&Credential::global("global-admin")));
        assert!(rule.matches(&Credential::new("global-admin", "anything")));
    }

    #[test]
    fn test_persisted_field_names() {
        let rule = CredentialRule::new("space-member", "space-1", privileges([Privilege::Read]));
        let json = serde_json::to_string(&rule).unwrap();
        assert_eq!(
            json,
            "{\"credentialType\":\"space-member\",\"resourceID\":\"space-1\",\
             \"grantedPrivileges\":[\"read\"]}"
        );
    }
}
