//! The batch resolution core.
//!
//! `load(key)` registers its key in the current collecting cycle and
//! suspends the caller (cooperatively, never blocking a thread) until the
//! cycle settles. The first registration of a cycle schedules a deferred
//! flush behind the tasks of the current unit of work, so every lookup
//! issued in that unit of work joins the same batch and one storage query
//! covers the whole collected key set.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use warden_core::{
    ActorContext, EntityId, Error, LoaderError, PolicyId, Result, StorageError,
};
use warden_policy::{Policy, PolicyEvaluator};

use crate::batch::{LoaderPhase, LoaderState, PendingLoad};
use crate::fetcher::{BatchFetcher, Projection, RelationRecord};
use crate::outcome::LoadOutcome;
use crate::registry::{LoaderConfig, ParentTypeDescriptor};

/// A request-scoped, batching, authorization-aware loader for one
/// (parent type, relation) pair.
///
/// Cheap to clone; clones share the same cycle and cache.
pub struct RelationLoader<V> {
    inner: Arc<LoaderInner<V>>,
}

impl<V> Clone for RelationLoader<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct LoaderInner<V> {
    descriptor: ParentTypeDescriptor,
    relation: String,
    fetcher: Arc<dyn BatchFetcher<V>>,
    evaluator: PolicyEvaluator,
    actor: ActorContext,
    config: LoaderConfig,
    projection: Projection,
    state: Mutex<LoaderState<V>>,
}

impl<V: Clone + Send + 'static> RelationLoader<V> {
    pub(crate) fn new(
        descriptor: ParentTypeDescriptor,
        relation: String,
        fetcher: Arc<dyn BatchFetcher<V>>,
        evaluator: PolicyEvaluator,
        actor: ActorContext,
        config: LoaderConfig,
    ) -> Self {
        let projection = match &config.fields {
            Some(fields) => Projection::of(fields.iter().cloned()),
            None => Projection::all(),
        };
        Self {
            inner: Arc::new(LoaderInner {
                descriptor,
                relation,
                fetcher,
                evaluator,
                actor,
                config,
                projection,
                state: Mutex::new(LoaderState::new()),
            }),
        }
    }

    /// Resolve one key.
    ///
    /// Returns a per-key outcome: the resolved value, a `NotFound`/`Null`
    /// sentinel, or a `Forbidden` sentinel when either authorization stage
    /// denies this key. An `Err` is returned only when the storage
    /// round-trip itself failed (rejecting every key in the batch
    /// uniformly) or the loader was disposed.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn load(&self, key: EntityId) -> Result<LoadOutcome<V>> {
        let rx = {
            let mut state = self.inner.state.lock();
            if state.phase == LoaderPhase::Disposed {
                return Err(LoaderError::Disposed.into());
            }
            if self.inner.config.cache {
                if let Some(outcome) = state.cache.get(&key) {
                    return Ok(outcome.clone());
                }
            }

            let (tx, rx) = oneshot::channel();
            let opens_cycle = state.pending.is_empty();
            state.pending.push(PendingLoad { key, tx });
            if opens_cycle {
                state.phase = LoaderPhase::Collecting;
                let inner = Arc::clone(&self.inner);
                tokio::spawn(async move {
                    // run behind everything already scheduled in this unit
                    // of work, so sibling lookups register first
                    tokio::task::yield_now().await;
                    LoaderInner::flush(inner).await;
                });
            }
            rx
        };

        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(LoaderError::Disposed.into()),
        }
    }

    /// Resolve an ordered key sequence; `result[i]` corresponds to
    /// `keys[i]`, duplicates allowed.
    pub async fn load_many(&self, keys: &[EntityId]) -> Vec<Result<LoadOutcome<V>>> {
        join_all(keys.iter().map(|key| self.load(*key))).await
    }

    /// Dispatch the current collecting cycle immediately.
    ///
    /// The deferred flush scheduled by `load` makes this unnecessary in
    /// normal operation; schedulers that drive dispatch explicitly can call
    /// it after their unit of work completes. A no-op when nothing is
    /// pending.
    pub async fn flush(&self) {
        LoaderInner::flush(Arc::clone(&self.inner)).await;
    }

    /// End-of-request teardown: discard the cache and fail pending loads.
    ///
    /// An in-flight storage query is not cancelled; its result is simply
    /// discarded when settlement finds the receivers gone.
    pub fn dispose(&self) {
        let pending = {
            let mut state = self.inner.state.lock();
            state.phase = LoaderPhase::Disposed;
            state.cache.clear();
            std::mem::take(&mut state.pending)
        };
        for load in pending {
            let _ = load.tx.send(Err(LoaderError::Disposed.into()));
        }
    }
}

impl<V: Clone + Send + 'static> LoaderInner<V> {
    /// Settle the current cycle: one batch fetch, per-key authorization,
    /// per-key delivery.
    async fn flush(inner: Arc<Self>) {
        let batch = {
            let mut state = inner.state.lock();
            if state.pending.is_empty() {
                return;
            }
            state.phase = LoaderPhase::Dispatched;
            std::mem::take(&mut state.pending)
        };

        // unique keys, submission order preserved
        let mut keys: Vec<EntityId> = Vec::with_capacity(batch.len());
        for load in &batch {
            if !keys.contains(&load.key) {
                keys.push(load.key);
            }
        }
        debug!(
            parent_type = inner.descriptor.type_name,
            relation = %inner.relation,
            keys = keys.len(),
            loads = batch.len(),
            "dispatching relation batch"
        );

        let fetched = inner.fetcher.fetch_relation(&keys, &inner.projection).await;
        let mut records: HashMap<EntityId, RelationRecord<V>> = match fetched {
            Ok(rows) => rows.into_iter().map(|row| (row.key, row)).collect(),
            Err(error) => {
                inner.reject_batch(batch, &error);
                return;
            }
        };

        if inner.config.stitch_value_policies {
            if let Err(error) = inner.stitch_value_policies(&mut records).await {
                inner.reject_batch(batch, &error);
                return;
            }
        }

        let mut settled: Vec<(PendingLoad<V>, LoadOutcome<V>)> = Vec::with_capacity(batch.len());
        for load in batch {
            let outcome = match records.get(&load.key) {
                Some(record) => inner.authorize(record),
                None if inner.config.resolve_missing_as_null => LoadOutcome::Null,
                None => LoadOutcome::NotFound,
            };
            settled.push((load, outcome));
        }

        {
            let mut state = inner.state.lock();
            if state.phase != LoaderPhase::Disposed {
                if inner.config.cache {
                    for (load, outcome) in &settled {
                        state.cache.insert(load.key, outcome.clone());
                    }
                }
                if state.phase == LoaderPhase::Dispatched {
                    state.phase = LoaderPhase::Settled;
                }
            }
        }

        for (load, outcome) in settled {
            // an abandoned caller has dropped its receiver; the outcome is
            // simply discarded
            let _ = load.tx.send(Ok(outcome));
        }
    }

    /// Fetch the relation policies that could not be eager-joined and
    /// stitch them onto their records by foreign key.
    async fn stitch_value_policies(
        &self,
        records: &mut HashMap<EntityId, RelationRecord<V>>,
    ) -> Result<()> {
        let mut missing: Vec<PolicyId> = records
            .values()
            .filter(|record| record.value_policy.is_none())
            .filter_map(|record| record.value_policy_id)
            .collect();
        missing.sort();
        missing.dedup();
        if missing.is_empty() {
            return Ok(());
        }

        let policies: HashMap<PolicyId, Policy> = self
            .fetcher
            .fetch_value_policies(&missing)
            .await?
            .into_iter()
            .collect();
        for record in records.values_mut() {
            if record.value_policy.is_none() {
                if let Some(policy_id) = record.value_policy_id {
                    record.value_policy = policies.get(&policy_id).cloned();
                }
            }
        }
        Ok(())
    }

    /// Apply the two optional authorization stages to one record.
    ///
    /// Every failure here, including an absent or corrupt policy, is caught
    /// locally and becomes this key's `Forbidden` sentinel; it must never
    /// escape and reject the whole batch, which would deny unrelated keys.
    fn authorize(&self, record: &RelationRecord<V>) -> LoadOutcome<V> {
        if let Some(required) = self.config.check_parent_privilege {
            let context = format!(
                "batched load {}.{}: parent check",
                self.descriptor.type_name, self.relation
            );
            if self
                .evaluator
                .grant_access_or_fail(
                    &self.actor,
                    record.parent_policy.as_ref(),
                    required,
                    &context,
                )
                .is_err()
            {
                return LoadOutcome::Forbidden;
            }
        }

        if let Some(required) = self.config.check_result_privilege {
            let context = format!(
                "batched load {}.{}: result check",
                self.descriptor.type_name, self.relation
            );
            if self
                .evaluator
                .grant_access_or_fail(
                    &self.actor,
                    record.value_policy.as_ref(),
                    required,
                    &context,
                )
                .is_err()
            {
                return LoadOutcome::Forbidden;
            }
        }

        LoadOutcome::Resolved(record.value.clone())
    }

    /// Storage failed: no partial result exists, every pending key in the
    /// batch is rejected uniformly.
    fn reject_batch(&self, batch: Vec<PendingLoad<V>>, error: &Error) {
        warn!(
            parent_type = self.descriptor.type_name,
            relation = %self.relation,
            %error,
            "batch fetch failed"
        );
        {
            let mut state = self.state.lock();
            if state.phase == LoaderPhase::Dispatched {
                state.phase = LoaderPhase::Settled;
            }
        }
        for load in batch {
            let _ = load.tx.send(Err(replicate_storage_error(error)));
        }
    }
}

/// One storage failure fans out to every pending caller; errors are not
/// clonable, so each caller gets an equivalent storage error.
fn replicate_storage_error(error: &Error) -> Error {
    match error {
        Error::Storage(StorageError::Connection(message)) => {
            StorageError::Connection(message.clone()).into()
        }
        other => StorageError::Query(other.to_string()).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        records: Vec<RelationRecord<String>>,
        calls: AtomicUsize,
    }

    impl CountingFetcher {
        fn with_row(key: EntityId, value: &str) -> Self {
            Self {
                records: vec![RelationRecord {
                    key,
                    parent_policy: None,
                    value: value.to_string(),
                    value_policy: None,
                    value_policy_id: None,
                }],
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl BatchFetcher<String> for CountingFetcher {
        async fn fetch_relation(
            &self,
            keys: &[EntityId],
            _projection: &Projection,
        ) -> Result<Vec<RelationRecord<String>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .records
                .iter()
                .filter(|record| keys.contains(&record.key))
                .cloned()
                .collect())
        }

        async fn fetch_value_policies(
            &self,
            _policy_ids: &[PolicyId],
        ) -> Result<Vec<(PolicyId, Policy)>> {
            Ok(Vec::new())
        }
    }

    fn loader_with(
        fetcher: Arc<CountingFetcher>,
        config: LoaderConfig,
    ) -> RelationLoader<String> {
        RelationLoader::new(
            ParentTypeDescriptor::new("space"),
            "community".to_string(),
            fetcher,
            PolicyEvaluator::new(),
            ActorContext::anonymous(),
            config,
        )
    }

    #[tokio::test]
    async fn test_cache_reuses_settled_outcome() {
        let key = EntityId::new();
        let fetcher = Arc::new(CountingFetcher::with_row(key, "community-1"));
        let loader = loader_with(Arc::clone(&fetcher), LoaderConfig::default());

        let first = loader.load(key).await.unwrap();
        let second = loader.load(key).await.unwrap();

        assert_eq!(first, LoadOutcome::Resolved("community-1".to_string()));
        assert_eq!(second, first);
        assert_eq!(fetcher.calls(), 1, "cached key must not fetch again");
    }

    #[tokio::test]
    async fn test_disabled_cache_fetches_again() {
        let key = EntityId::new();
        let fetcher = Arc::new(CountingFetcher::with_row(key, "community-1"));
        let config = LoaderConfig {
            cache: false,
            ..LoaderConfig::default()
        };
        let loader = loader_with(Arc::clone(&fetcher), config);

        loader.load(key).await.unwrap();
        loader.load(key).await.unwrap();

        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_keys_after_dispatch_start_a_fresh_cycle() {
        let key = EntityId::new();
        let other = EntityId::new();
        let fetcher = Arc::new(CountingFetcher::with_row(key, "community-1"));
        let loader = loader_with(Arc::clone(&fetcher), LoaderConfig::default());

        loader.load(key).await.unwrap();
        let outcome = loader.load(other).await.unwrap();

        assert_eq!(outcome, LoadOutcome::NotFound);
        assert_eq!(fetcher.calls(), 2, "late key opens a second batch");
    }

    #[tokio::test]
    async fn test_missing_key_resolves_to_null_when_configured() {
        let fetcher = Arc::new(CountingFetcher::with_row(EntityId::new(), "x"));
        let config = LoaderConfig {
            resolve_missing_as_null: true,
            ..LoaderConfig::default()
        };
        let loader = loader_with(fetcher, config);

        let outcome = loader.load(EntityId::new()).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Null);
    }

    #[tokio::test]
    async fn test_dispose_fails_pending_loads() {
        let key = EntityId::new();
        let fetcher = Arc::new(CountingFetcher::with_row(key, "community-1"));
        let loader = loader_with(fetcher, LoaderConfig::default());

        let pending = tokio::spawn({
            let loader = loader.clone();
            async move { loader.load(key).await }
        });
        // let the spawned load register before tearing down
        tokio::task::yield_now().await;
        loader.dispose();

        let result = pending.await.unwrap();
        assert!(matches!(
            result,
            Err(Error::Loader(LoaderError::Disposed))
        ));

        // and a disposed loader refuses new loads outright
        assert!(matches!(
            loader.load(key).await,
            Err(Error::Loader(LoaderError::Disposed))
        ));
    }

    #[tokio::test]
    async fn test_load_suspends_until_the_batch_dispatches() {
        let key = EntityId::new();
        let fetcher = Arc::new(CountingFetcher::with_row(key, "community-1"));
        let loader = loader_with(Arc::clone(&fetcher), LoaderConfig::default());

        let mut suspended = tokio_test::task::spawn(loader.load(key));
        assert!(suspended.poll().is_pending(), "caller suspends while collecting");

        // explicit dispatch settles the cycle and wakes the caller
        loader.flush().await;
        match suspended.poll() {
            std::task::Poll::Ready(outcome) => assert_eq!(
                outcome.unwrap(),
                LoadOutcome::Resolved("community-1".to_string())
            ),
            std::task::Poll::Pending => panic!("load should settle after flush"),
        }
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_explicit_flush_is_noop_when_nothing_pending() {
        let fetcher = Arc::new(CountingFetcher::with_row(EntityId::new(), "x"));
        let loader = loader_with(Arc::clone(&fetcher), LoaderConfig::default());
        loader.flush().await;
        assert_eq!(fetcher.calls(), 0);
    }
}
