//! The storage seam for batched resolution.
//!
//! Two storage backends exist (a legacy relational mapper and a newer typed
//! query layer); both hide behind [`BatchFetcher`], chosen at composition
//! time. The registry and the resolution core depend only on this trait.

use async_trait::async_trait;
use warden_core::{EntityId, PolicyId, Result};
use warden_policy::Policy;

/// The identifier column every projection must carry.
pub const COLUMN_ID: &str = "id";

/// The policy relation column the authorization stages require.
pub const COLUMN_AUTHORIZATION: &str = "authorization";

/// Field narrowing for a batch query.
///
/// A projection may narrow the fetched columns, but the identifier and the
/// authorization columns are always force-included; the two check stages
/// need them regardless of what the caller selected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Projection {
    columns: Option<Vec<String>>,
}

impl Projection {
    /// Fetch every column.
    pub fn all() -> Self {
        Self { columns: None }
    }

    /// Fetch the given columns plus the ones authorization requires.
    pub fn of<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns: Vec<String> = fields.into_iter().map(Into::into).collect();
        for required in [COLUMN_ID, COLUMN_AUTHORIZATION] {
            if !columns.iter().any(|c| c == required) {
                columns.push(required.to_string());
            }
        }
        Self {
            columns: Some(columns),
        }
    }

    /// The selected columns; `None` means every column.
    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }
}

/// One row of the parent-plus-relation join, keyed by the parent's id.
#[derive(Clone, Debug)]
pub struct RelationRecord<V> {
    /// The lookup key (parent entity id).
    pub key: EntityId,

    /// The parent's policy, when eager-joined.
    pub parent_policy: Option<Policy>,

    /// The resolved relation value.
    pub value: V,

    /// The relation's own policy, when it could be eager-joined.
    pub value_policy: Option<Policy>,

    /// Foreign key of the relation's policy, for the separate stitch fetch
    /// when the nested join is not safe.
    pub value_policy_id: Option<PolicyId>,
}

/// A storage backend capable of batched relation fetches.
///
/// `fetch_relation` must answer the whole key set in a single round-trip.
/// `fetch_value_policies` exists for relations whose own nested policy
/// cannot be eager-joined safely: those policies are batch-fetched by
/// foreign key and stitched back by the core. Keeping joins at most two
/// levels deep is practice here regardless of backend.
#[async_trait]
pub trait BatchFetcher<V>: Send + Sync {
    async fn fetch_relation(
        &self,
        keys: &[EntityId],
        projection: &Projection,
    ) -> Result<Vec<RelationRecord<V>>>;

    async fn fetch_value_policies(
        &self,
        policy_ids: &[PolicyId],
    ) -> Result<Vec<(PolicyId, Policy)>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_all_selects_everything() {
        assert_eq!(Projection::all().columns(), None);
    }

    #[test]
    fn test_projection_forces_required_columns() {
        let projection = Projection::of(["displayName", "nameID"]);
        let columns = projection.columns().unwrap();
        assert_eq!(columns, ["displayName", "nameID", "id", "authorization"]);
    }

    #[test]
    fn test_projection_does_not_duplicate_required_columns() {
        let projection = Projection::of(["id", "displayName"]);
        let columns = projection.columns().unwrap();
        assert_eq!(columns, ["id", "displayName", "authorization"]);
    }
}
