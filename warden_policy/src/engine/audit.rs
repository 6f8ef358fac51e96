//! Denial auditing.
//!
//! A bounded in-memory record of denied access attempts, kept alongside the
//! WARN-level log records. Successes are never recorded.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use warden_core::{ActorId, Privilege};

/// One denied access attempt.
#[derive(Debug, Clone)]
pub struct DenialEntry {
    /// When the denial happened.
    pub timestamp: DateTime<Utc>,

    /// The actor that was denied.
    pub actor_id: ActorId,

    /// The privilege that was required.
    pub required: Privilege,

    /// The audit context supplied by the caller, verbatim.
    pub context: String,
}

/// A denial log, capped per actor.
#[derive(Clone)]
pub struct AuditLog {
    entries: Arc<DashMap<ActorId, Vec<DenialEntry>>>,
    max_entries_per_actor: usize,
}

impl AuditLog {
    pub fn new(max_entries_per_actor: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            max_entries_per_actor,
        }
    }

    /// Record a denial for an actor, dropping the oldest entries beyond the
    /// per-actor cap.
    pub fn record_denial(&self, actor_id: ActorId, required: Privilege, context: &str) {
        let entry = DenialEntry {
            timestamp: Utc::now(),
            actor_id,
            required,
            context: context.to_string(),
        };

        let mut actor_entries = self.entries.entry(actor_id).or_default();
        actor_entries.push(entry);
        if actor_entries.len() > self.max_entries_per_actor {
            let overflow = actor_entries.len() - self.max_entries_per_actor;
            actor_entries.drain(0..overflow);
        }
    }

    /// Get the recorded denials for an actor, oldest first.
    pub fn entries_for(&self, actor_id: &ActorId) -> Vec<DenialEntry> {
        match self.entries.get(actor_id) {
            Some(entries) => entries.clone(),
            None => Vec::new(),
        }
    }

    /// Drop all recorded denials for an actor.
    pub fn clear(&self, actor_id: &ActorId) {
        self.entries.remove(actor_id);
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(1000)
    }
}
