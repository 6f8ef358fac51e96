//! Internal state of a batching loader.

use std::collections::HashMap;

use tokio::sync::oneshot;
use warden_core::{EntityId, Result};

use crate::outcome::LoadOutcome;

/// Lifecycle of a loader's current batching cycle.
///
/// Keys submitted after dispatch never join an already-dispatched batch;
/// they open a fresh collecting cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LoaderPhase {
    /// No key has been registered yet.
    Constructed,

    /// Keys are queueing as callers register them within one unit of work.
    Collecting,

    /// The single batch fetch for the collected key set is in flight.
    Dispatched,

    /// Per-key outcomes have been delivered.
    Settled,

    /// The owning request ended; the cache is discarded and pending callers
    /// are failed.
    Disposed,
}

/// A caller suspended on one key.
pub(crate) struct PendingLoad<V> {
    pub key: EntityId,
    pub tx: oneshot::Sender<Result<LoadOutcome<V>>>,
}

/// Mutable loader state. Exactly one request writes it, by construction.
pub(crate) struct LoaderState<V> {
    pub phase: LoaderPhase,

    /// The current collecting cycle, in submission order.
    pub pending: Vec<PendingLoad<V>>,

    /// Settled outcomes, keyed by raw lookup key; lives and dies with the
    /// request.
    pub cache: HashMap<EntityId, LoadOutcome<V>>,
}

impl<V> LoaderState<V> {
    pub fn new() -> Self {
        Self {
            phase: LoaderPhase::Constructed,
            pending: Vec::new(),
            cache: HashMap::new(),
        }
    }
}
