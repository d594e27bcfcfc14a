//! Diagnostic handlers: `cap.echo` plus instrumented variants used by the
//! engine test suite.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::context::CapabilityContext;
use crate::error::EngineError;
use crate::registry::CapabilityHandler;

/// Returns its argument unchanged.
pub struct Echo;

#[async_trait]
impl CapabilityHandler for Echo {
    async fn invoke(
        &self,
        args: &serde_json::Value,
        _ctx: &CapabilityContext,
    ) -> Result<serde_json::Value, EngineError> {
        Ok(args.clone())
    }
}

/// Echo that counts invocations, for dedup assertions.
#[derive(Default)]
pub struct CountingEcho {
    calls: Arc<AtomicUsize>,
}

impl CountingEcho {
    pub fn new() -> Self {
        CountingEcho::default()
    }

    /// Shared counter; clones observe the same count.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl CapabilityHandler for CountingEcho {
    async fn invoke(
        &self,
        args: &serde_json::Value,
        _ctx: &CapabilityContext,
    ) -> Result<serde_json::Value, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(args.clone())
    }
}

/// Sleeps for a fixed delay before echoing, for timeout tests.
pub struct Stall {
    pub delay: Duration,
}

#[async_trait]
impl CapabilityHandler for Stall {
    async fn invoke(
        &self,
        args: &serde_json::Value,
        _ctx: &CapabilityContext,
    ) -> Result<serde_json::Value, EngineError> {
        tokio::time::sleep(self.delay).await;
        Ok(args.clone())
    }
}

/// Fails every invocation.
pub struct AlwaysFail;

#[async_trait]
impl CapabilityHandler for AlwaysFail {
    async fn invoke(
        &self,
        _args: &serde_json::Value,
        _ctx: &CapabilityContext,
    ) -> Result<serde_json::Value, EngineError> {
        Err(EngineError::Handler("forced failure".to_string()))
    }
}
