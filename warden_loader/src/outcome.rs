//! Per-key load outcomes.

/// The outcome of resolving one key in a batch.
///
/// `NotFound` and `Forbidden` are sentinels, not errors: they attach to one
/// position in the batched result and leave every sibling key untouched.
/// Only a failure of the storage round-trip itself surfaces as an `Err`,
/// rejecting the whole batch uniformly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome<V> {
    /// The key resolved and the actor may see the value.
    Resolved(V),

    /// No row for this key.
    NotFound,

    /// No row for this key, flattened to a null-like outcome
    /// (`resolve_missing_as_null` configuration).
    Null,

    /// A row exists but the actor failed an authorization stage.
    Forbidden,
}

impl<V> LoadOutcome<V> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, LoadOutcome::Resolved(_))
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, LoadOutcome::Forbidden)
    }

    /// The resolved value, if any.
    pub fn resolved(self) -> Option<V> {
        match self {
            LoadOutcome::Resolved(value) => Some(value),
            _ => None,
        }
    }

    /// Map the resolved value, keeping sentinels as they are.
    pub fn map<U, F: FnOnce(V) -> U>(self, f: F) -> LoadOutcome<U> {
        match self {
            LoadOutcome::Resolved(value) => LoadOutcome::Resolved(f(value)),
            LoadOutcome::NotFound => LoadOutcome::NotFound,
            LoadOutcome::Null => LoadOutcome::Null,
            LoadOutcome::Forbidden => LoadOutcome::Forbidden,
        }
    }
}
