//! Relay membership capability.

use async_trait::async_trait;
use serde_json::json;

use crate::context::CapabilityContext;
use crate::error::EngineError;
use crate::handlers::identity_field;
use crate::registry::CapabilityHandler;

/// `relay.presence {id?}`: the relays carrying the subject.
pub struct RelayPresence;

#[async_trait]
impl CapabilityHandler for RelayPresence {
    async fn invoke(
        &self,
        args: &serde_json::Value,
        ctx: &CapabilityContext,
    ) -> Result<serde_json::Value, EngineError> {
        let id = identity_field(args, "id").unwrap_or_else(|| ctx.target.clone());
        let relays = ctx.relays.relays_for(&id);
        Ok(json!({
            "id": id.as_str(),
            "count": relays.len(),
            "relays": relays,
        }))
    }
}
