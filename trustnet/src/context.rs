//! Execution context handed to capability handlers.
//!
//! Handlers reach external systems only through the trait objects carried
//! here: the follow graph, the outbound network pool, and the relay
//! directory. The context also exposes the identities of the evaluation
//! and a per-run side cache handlers may use for memoization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::types::{EvaluationInput, Identity};

/// Read access to the follow graph.
pub trait SocialGraph: Send + Sync {
    /// Hop distance along follow edges, `None` when unreachable.
    fn distance(&self, from: &Identity, to: &Identity) -> Option<u32>;

    /// Identities `who` follows.
    fn follows(&self, who: &Identity) -> Vec<Identity>;

    /// Identities following `whom`.
    fn followers(&self, whom: &Identity) -> Vec<Identity>;
}

/// Outbound requests to remote services, e.g. alias resolvers.
#[async_trait]
pub trait NetworkPool: Send + Sync {
    async fn resolve_alias(&self, alias: &str) -> Result<Option<Identity>, EngineError>;
}

/// Relay membership information.
pub trait RelayDirectory: Send + Sync {
    fn relays_for(&self, identity: &Identity) -> Vec<String>;
}

/// The external collaborators an engine is wired with. Cloning shares the
/// underlying trait objects.
#[derive(Clone)]
pub struct Collaborators {
    pub graph: Arc<dyn SocialGraph>,
    pub pool: Arc<dyn NetworkPool>,
    pub relays: Arc<dyn RelayDirectory>,
}

/// Mutable scratch space scoped to one evaluation run. Handlers may stash
/// intermediate results here; the cache is dropped with the run.
#[derive(Debug, Default)]
pub struct SideCache {
    entries: Mutex<HashMap<String, serde_json::Value>>,
}

impl SideCache {
    pub fn new() -> Self {
        SideCache::default()
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        match self.entries.lock() {
            Ok(entries) => entries.get(key).cloned(),
            Err(_) => None,
        }
    }

    pub fn put(&self, key: impl Into<String>, value: serde_json::Value) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.into(), value);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything a capability handler may see for one request. The identities
/// mirror the evaluation input; handlers use them to default omitted
/// argument fields.
#[derive(Clone)]
pub struct CapabilityContext {
    pub target: Identity,
    pub source: Option<Identity>,
    /// Budget for a single handler invocation; long-running handlers can
    /// use it to bound their own sub-requests.
    pub capability_timeout: Duration,
    pub graph: Arc<dyn SocialGraph>,
    pub pool: Arc<dyn NetworkPool>,
    pub relays: Arc<dyn RelayDirectory>,
    pub cache: Arc<SideCache>,
}

impl CapabilityContext {
    /// Context for one evaluation run, with a fresh side cache.
    pub fn for_input(
        input: &EvaluationInput,
        capability_timeout: Duration,
        collaborators: &Collaborators,
    ) -> Self {
        CapabilityContext {
            target: input.target.clone(),
            source: input.source.clone(),
            capability_timeout,
            graph: Arc::clone(&collaborators.graph),
            pool: Arc::clone(&collaborators.pool),
            relays: Arc::clone(&collaborators.relays),
            cache: Arc::new(SideCache::new()),
        }
    }
}
