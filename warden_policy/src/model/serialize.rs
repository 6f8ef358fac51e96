//! The (de)serialization contract for persisted rule lists.
//!
//! Rule lists are stored as a serialized JSON sequence on the policy row.
//! Absent or empty always serializes as `[]`, never null, which keeps the
//! composer's append operations total. A blob that fails to parse is a
//! corrupt policy and fails closed; it is never read as an empty list.

use serde::{Deserialize, Serialize};
use tracing::error;
use warden_core::{Error, PolicyError, PolicyId, Result};

use super::rule::{CredentialRule, PrivilegeRule};
use super::{Policy, PolicyType};

/// Serialize a credential rule list to its persisted form.
pub fn serialize_credential_rules(rules: &[CredentialRule]) -> Result<String> {
    serde_json::to_string(rules).map_err(|e| Error::Serialization(e.to_string()))
}

/// Deserialize a persisted credential rule list.
///
/// The empty string is the empty list; a parse failure is
/// [`PolicyError::Corrupt`].
pub fn deserialize_credential_rules(raw: &str) -> Result<Vec<CredentialRule>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(|e| {
        let message = format!("unable to parse credential rules: {e}");
        error!(%message, "corrupt authorization policy");
        Error::from(PolicyError::Corrupt(message))
    })
}

/// Serialize a privilege rule list to its persisted form.
pub fn serialize_privilege_rules(rules: &[PrivilegeRule]) -> Result<String> {
    serde_json::to_string(rules).map_err(|e| Error::Serialization(e.to_string()))
}

/// Deserialize a persisted privilege rule list.
pub fn deserialize_privilege_rules(raw: &str) -> Result<Vec<PrivilegeRule>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(|e| {
        let message = format!("unable to parse privilege rules: {e}");
        error!(%message, "corrupt authorization policy");
        Error::from(PolicyError::Corrupt(message))
    })
}

/// A policy as stored: rule lists flattened to their serialized blobs.
///
/// This is the row shape a relational backend reads and writes; converting
/// back into a [`Policy`] is where corruption surfaces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRecord {
    pub id: PolicyId,
    pub credential_rules: String,
    pub verified_credential_rules: String,
    pub privilege_rules: String,
    pub anonymous_read_access: bool,
    #[serde(rename = "type")]
    pub policy_type: PolicyType,
}

impl PolicyRecord {
    /// Flatten a policy into its persisted row shape.
    pub fn from_policy(policy: &Policy) -> Result<Self> {
        Ok(Self {
            id: policy.id,
            credential_rules: serialize_credential_rules(&policy.credential_rules)?,
            verified_credential_rules: serialize_credential_rules(
                &policy.verified_credential_rules,
            )?,
            privilege_rules: serialize_privilege_rules(&policy.privilege_rules)?,
            anonymous_read_access: policy.anonymous_read_access,
            policy_type: policy.policy_type,
        })
    }

    /// Rehydrate the policy, failing closed on any corrupt rule blob.
    pub fn into_policy(self) -> Result<Policy> {
        Ok(Policy {
            id: self.id,
            credential_rules: deserialize_credential_rules(&self.credential_rules)?,
            verified_credential_rules: deserialize_credential_rules(
                &self.verified_credential_rules,
            )?,
            privilege_rules: deserialize_privilege_rules(&self.privilege_rules)?,
            anonymous_read_access: self.anonymous_read_access,
            policy_type: self.policy_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::privilege::privileges;
    use warden_core::{Privilege, PolicyError};

    fn sample_rules() -> Vec<CredentialRule> {
        vec![
            CredentialRule::new(
                "space-admin",
                "space-1",
                privileges([Privilege::Read, Privilege::Update, Privilege::Grant]),
            ),
            CredentialRule::new("space-member", "space-1", privileges([Privilege::Read])),
            // duplicate entries are legal and must survive the round-trip
            CredentialRule::new("space-member", "space-1", privileges([Privilege::Read])),
        ]
    }

    #[test]
    fn test_empty_list_serializes_as_empty_sequence() {
        assert_eq!(serialize_credential_rules(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_empty_string_deserializes_as_empty_list() {
        assert!(deserialize_credential_rules("").unwrap().is_empty());
        assert!(deserialize_privilege_rules("").unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_is_stable() {
        // serialize -> deserialize -> serialize: no reordering, no loss
        let rules = sample_rules();
        let first = serialize_credential_rules(&rules).unwrap();
        let parsed = deserialize_credential_rules(&first).unwrap();
        assert_eq!(parsed, rules);
        let second = serialize_credential_rules(&parsed).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_corrupt_blob_fails_closed() {
        let result = deserialize_credential_rules("{not json");
        match result {
            Err(Error::Policy(PolicyError::Corrupt(_))) => {}
            other => panic!("expected corrupt policy error, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_blob_is_corrupt_not_empty() {
        // a blob cut off mid-record must never be read as "no rules"
        let full = serialize_credential_rules(&sample_rules()).unwrap();
        let truncated = &full[..full.len() / 2];
        assert!(deserialize_credential_rules(truncated).is_err());
    }

    #[test]
    fn test_policy_record_round_trip() {
        let mut policy = Policy::empty(PolicyType::Space);
        policy.credential_rules = sample_rules();
        policy.privilege_rules = vec![PrivilegeRule::new(
            Privilege::Grant,
            privileges([Privilege::Update]),
        )];
        policy.anonymous_read_access = true;

        let record = PolicyRecord::from_policy(&policy).unwrap();
        let back = record.into_policy().unwrap();
        assert_eq!(back, policy);
    }

    #[test]
    fn test_policy_record_with_corrupt_rules_fails_closed() {
        let record = PolicyRecord {
            id: PolicyId::new(),
            credential_rules: "[{\"credentialType\":".to_string(),
            verified_credential_rules: "[]".to_string(),
            privilege_rules: "[]".to_string(),
            anonymous_read_access: false,
            policy_type: PolicyType::Space,
        };
        assert!(record.into_policy().is_err());
    }
}
