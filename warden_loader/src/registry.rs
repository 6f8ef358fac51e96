//! Loader wiring: parent-type descriptors, loader configuration, and
//! per-request factories.
//!
//! Everything here happens at composition time. A loader wired against an
//! unknown parent type fails immediately with a configuration error; a
//! request never discovers a miswired loader.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use warden_core::{ActorContext, LoaderError, Privilege, Result};
use warden_policy::PolicyEvaluator;

use crate::fetcher::{BatchFetcher, COLUMN_AUTHORIZATION, COLUMN_ID};
use crate::loader::RelationLoader;

/// Wiring-time description of a parent entity type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentTypeDescriptor {
    pub type_name: &'static str,
    pub id_column: &'static str,
    pub policy_column: &'static str,
}

impl ParentTypeDescriptor {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            id_column: COLUMN_ID,
            policy_column: COLUMN_AUTHORIZATION,
        }
    }

    pub fn with_columns(
        type_name: &'static str,
        id_column: &'static str,
        policy_column: &'static str,
    ) -> Self {
        Self {
            type_name,
            id_column,
            policy_column,
        }
    }
}

/// Configuration for one (parent type, relation) loader.
#[derive(Clone, Debug)]
pub struct LoaderConfig {
    /// Reuse settled outcomes for repeated keys within one request.
    pub cache: bool,

    /// Optional field narrowing for the fetched relation; the identifier
    /// and authorization columns are always included regardless.
    pub fields: Option<Vec<String>>,

    /// Privilege the actor needs on the parent to see the relation at all.
    pub check_parent_privilege: Option<Privilege>,

    /// Privilege the actor needs on the resolved entity itself, which may
    /// carry its own independently-inherited policy.
    pub check_result_privilege: Option<Privilege>,

    /// Resolve missing rows as `Null` instead of the `NotFound` sentinel.
    pub resolve_missing_as_null: bool,

    /// Batch-fetch relation policies separately by foreign key and stitch
    /// them back, instead of eager-joining a third level.
    pub stitch_value_policies: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache: true,
            fields: None,
            check_parent_privilege: None,
            check_result_privilege: None,
            resolve_missing_as_null: false,
            stitch_value_policies: false,
        }
    }
}

/// The registry of parent-type descriptors loaders can be wired against.
#[derive(Default)]
pub struct LoaderRegistry {
    descriptors: HashMap<&'static str, ParentTypeDescriptor>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: ParentTypeDescriptor) {
        self.descriptors.insert(descriptor.type_name, descriptor);
    }

    /// Look up a descriptor; absence is a configuration error, surfaced at
    /// wiring time and never deferred to request time.
    pub fn descriptor_or_fail(&self, type_name: &str) -> Result<&ParentTypeDescriptor> {
        self.descriptors.get(type_name).ok_or_else(|| {
            LoaderError::Configuration(format!(
                "no parent type descriptor registered for '{type_name}'"
            ))
            .into()
        })
    }

    /// Wire a loader factory for a (parent type, relation) pair.
    pub fn factory<V>(
        &self,
        parent_type: &str,
        relation: &str,
        fetcher: Arc<dyn BatchFetcher<V>>,
        evaluator: PolicyEvaluator,
        config: LoaderConfig,
    ) -> Result<RelationLoaderFactory<V>>
    where
        V: Clone + Send + 'static,
    {
        let descriptor = self.descriptor_or_fail(parent_type)?.clone();
        debug!(parent_type, relation, "wired relation loader factory");
        Ok(RelationLoaderFactory {
            descriptor,
            relation: relation.to_string(),
            fetcher,
            evaluator,
            config,
        })
    }
}

/// Mints request-scoped loaders for one wired (parent type, relation) pair.
pub struct RelationLoaderFactory<V> {
    descriptor: ParentTypeDescriptor,
    relation: String,
    fetcher: Arc<dyn BatchFetcher<V>>,
    evaluator: PolicyEvaluator,
    config: LoaderConfig,
}

impl<V: Clone + Send + 'static> RelationLoaderFactory<V> {
    /// Mint the loader for one request. The loader and its cache live
    /// exactly as long as the request.
    pub fn for_request(&self, actor: ActorContext) -> RelationLoader<V> {
        RelationLoader::new(
            self.descriptor.clone(),
            self.relation.clone(),
            Arc::clone(&self.fetcher),
            self.evaluator.clone(),
            actor,
            self.config.clone(),
        )
    }
}
