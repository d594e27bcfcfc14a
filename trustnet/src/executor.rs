//! Capability executor.
//!
//! Resolves one canonicalized request: planning-store fast path first,
//! then the enablement gate, then the handler raced against its timeout.
//! Every outcome, including failure, is written back to the store under
//! the request key so repeats of the same request never execute twice.
//!
//! Timeouts are best-effort: losing the race drops the handler future,
//! which abandons rather than interrupts any work the handler has already
//! delegated elsewhere.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tsl::Value;

use crate::catalog::EnablementPolicy;
use crate::context::CapabilityContext;
use crate::error::EngineError;
use crate::planning::PlanningStore;
use crate::registry::CapabilityRegistry;

/// One capability request after canonicalization. Unplannable arguments
/// never get this far; `key` always exists.
#[derive(Debug, Clone)]
pub struct CapabilityRequest {
    pub key: String,
    pub capability: String,
    pub argument: serde_json::Value,
    pub timeout: Duration,
}

/// Outcome of one request. A failed request carries `Null` so bindings can
/// be filled either way.
#[derive(Debug, Clone)]
pub struct CapabilityResponse {
    pub ok: bool,
    pub value: Value,
    pub error: Option<String>,
    pub elapsed: Duration,
}

impl CapabilityResponse {
    fn success(value: Value, elapsed: Duration) -> Self {
        CapabilityResponse {
            ok: true,
            value,
            error: None,
            elapsed,
        }
    }

    fn failure(error: String, elapsed: Duration) -> Self {
        CapabilityResponse {
            ok: false,
            value: Value::Null,
            error: Some(error),
            elapsed,
        }
    }
}

pub struct CapabilityExecutor {
    registry: CapabilityRegistry,
    policy: Arc<EnablementPolicy>,
}

impl CapabilityExecutor {
    pub fn new(registry: CapabilityRegistry, policy: Arc<EnablementPolicy>) -> Self {
        CapabilityExecutor { registry, policy }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Resolve one request against the store, invoking the handler only on
    /// a miss. The resolved value is always stored afterwards, `Null`
    /// included, so later repeats hit the fast path.
    pub async fn execute(
        &self,
        request: &CapabilityRequest,
        ctx: &CapabilityContext,
        store: Option<&PlanningStore>,
    ) -> CapabilityResponse {
        let started = Instant::now();
        if let Some(store) = store {
            if let Some(cached) = store.get(&request.key) {
                log::debug!("planning store hit for `{}`", request.capability);
                return CapabilityResponse::success(cached, started.elapsed());
            }
        }

        let response = self.invoke(request, ctx).await;
        if let Some(store) = store {
            store.set(request.key.clone(), response.value.clone());
        }
        response
    }

    async fn invoke(
        &self,
        request: &CapabilityRequest,
        ctx: &CapabilityContext,
    ) -> CapabilityResponse {
        let started = Instant::now();

        if !self.policy.allows(&request.capability) {
            log::debug!("capability `{}` is disabled", request.capability);
            return CapabilityResponse::failure(
                EngineError::CapabilityDisabled(request.capability.clone()).to_string(),
                started.elapsed(),
            );
        }

        let handler = match self.registry.get(&request.capability) {
            Some(handler) => handler,
            None => {
                log::warn!("capability `{}` is not registered", request.capability);
                return CapabilityResponse::failure(
                    EngineError::UnknownCapability(request.capability.clone()).to_string(),
                    started.elapsed(),
                );
            }
        };

        match tokio::time::timeout(request.timeout, handler.invoke(&request.argument, ctx)).await {
            Ok(Ok(json)) => {
                CapabilityResponse::success(Value::from_json(&json), started.elapsed())
            }
            Ok(Err(err)) => {
                log::warn!("capability `{}` failed: {}", request.capability, err);
                CapabilityResponse::failure(err.to_string(), started.elapsed())
            }
            Err(_) => {
                let timeout_ms = request.timeout.as_millis() as u64;
                log::warn!(
                    "capability `{}` timed out after {} ms",
                    request.capability,
                    timeout_ms
                );
                CapabilityResponse::failure(
                    EngineError::CapabilityTimeout {
                        name: request.capability.clone(),
                        timeout_ms,
                    }
                    .to_string(),
                    started.elapsed(),
                )
            }
        }
    }
}
