//! # Warden Loader
//!
//! `warden_loader` provides the batched, authorization-aware entity
//! resolution layer: every field-level data fetch routes through a
//! request-scoped loader that collapses concurrently-issued single-key
//! lookups into one storage round-trip and applies per-key authorization
//! during settlement.
//!
//! Key concepts:
//!
//! 1. **Batch fetcher**: the one capability the storage backends hide
//!    behind; the core never talks to storage directly.
//!
//! 2. **Load outcome**: typed per-key sentinels (`NotFound`, `Forbidden`)
//!    instead of exceptions, so one denied key never rejects its siblings.
//!
//! 3. **Loader registry**: wiring-time descriptors for parent entity types;
//!    misconfiguration fails at composition time, never at request time.

pub mod fetcher;
pub mod loader;
pub mod outcome;
pub mod registry;

mod batch;

// Re-export key types for convenience
pub use fetcher::{BatchFetcher, Projection, RelationRecord};
pub use loader::RelationLoader;
pub use outcome::LoadOutcome;
pub use registry::{LoaderConfig, LoaderRegistry, ParentTypeDescriptor, RelationLoaderFactory};
