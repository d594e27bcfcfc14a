//! Capability handler registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::CapabilityContext;
use crate::error::EngineError;

/// One host-gated operation. Handlers receive a JSON argument and must
/// produce JSON; the boundary keeps capability responses inside the
/// plannable value space.
#[async_trait]
pub trait CapabilityHandler: Send + Sync {
    async fn invoke(
        &self,
        args: &serde_json::Value,
        ctx: &CapabilityContext,
    ) -> Result<serde_json::Value, EngineError>;
}

/// Name-to-handler map. Registration happens while wiring the engine;
/// lookups afterwards are read-only.
#[derive(Default, Clone)]
pub struct CapabilityRegistry {
    handlers: HashMap<String, Arc<dyn CapabilityHandler>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        CapabilityRegistry::default()
    }

    pub fn register(&mut self, name: &str, handler: Arc<dyn CapabilityHandler>) {
        if self.handlers.insert(name.to_string(), handler).is_some() {
            log::debug!("capability `{}` re-registered", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn CapabilityHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted for stable listings.
    pub fn capability_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
