//! Error types for the Warden authorization system.
//!
//! This module defines the error hierarchy shared across the workspace.
//! Everything that can deny access fails closed: an absent policy and a
//! corrupt policy are errors in their own right, never "zero privileges".

use thiserror::Error;

use crate::id::PolicyId;
use crate::privilege::Privilege;

/// Root error type for the Warden system.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Loader error: {0}")]
    Loader(#[from] LoaderError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors related to authorization policies and their evaluation.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The entity's policy relation is unexpectedly missing. Distinct from a
    /// policy that grants nothing; always a denial.
    #[error("No authorization policy provided: {0}")]
    Absent(String),

    /// Persisted rules failed to deserialize. Never treated as an empty rule
    /// list.
    #[error("Stored authorization rules failed to deserialize: {0}")]
    Corrupt(String),

    /// The actor lacks the required privilege.
    #[error("Unable to grant '{required}' privilege: {context}")]
    Forbidden {
        required: Privilege,
        context: String,
    },

    /// No policy row for the given id.
    #[error("Authorization policy not found: {0}")]
    NotFound(PolicyId),

    /// A rule that can never match (e.g. an empty credential type).
    #[error("Invalid authorization rule: {0}")]
    InvalidRule(String),
}

/// Errors related to batched entity resolution.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The loader was wired against a parent type the registry does not
    /// know. Raised at composition time, never at request time.
    #[error("Loader misconfigured: {0}")]
    Configuration(String),

    /// The request ended before the batch settled.
    #[error("Loader disposed before the batch settled")]
    Disposed,
}

/// Errors from the storage round-trip itself.
///
/// Unlike per-key authorization failures these reject every pending key in
/// the affected batch, since no partial result exists to salvage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Connection failed: {0}")]
    Connection(String),
}

/// Result type used throughout the Warden system.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True when the error denies access (as opposed to an infrastructure
    /// failure).
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            Error::Policy(
                PolicyError::Absent(_) | PolicyError::Corrupt(_) | PolicyError::Forbidden { .. }
            )
        )
    }
}
