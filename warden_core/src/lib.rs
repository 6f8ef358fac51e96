//! # Warden Core
//!
//! `warden_core` provides the shared vocabulary for the Warden authorization
//! system: strongly-typed identifiers, credentials and privileges, the
//! per-request actor context, and the error hierarchy used by every crate in
//! the workspace.
//!
//! Key concepts:
//!
//! 1. **Credential**: a (type, resourceID) claim asserting an actor's role or
//!    relationship to a resource.
//!
//! 2. **Privilege**: an atomic permitted action on a governed entity; granted
//!    privileges are always handled as sets.
//!
//! 3. **Actor context**: the request-scoped description of who is asking,
//!    supplied by the authentication layer and never persisted here.

pub mod actor;
pub mod credential;
pub mod error;
pub mod id;
pub mod privilege;

// Re-export key types for convenience
pub use actor::ActorContext;
pub use credential::{Credential, CredentialCriteria};
pub use error::{Error, LoaderError, PolicyError, Result, StorageError};
pub use id::{ActorId, EntityId, PolicyId};
pub use privilege::{Privilege, PrivilegeSet};
