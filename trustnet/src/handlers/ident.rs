//! Identity resolution capability.

use async_trait::async_trait;
use serde_json::json;

use crate::context::CapabilityContext;
use crate::error::EngineError;
use crate::registry::CapabilityHandler;

/// `id.resolve {alias}`: resolve an external alias through the network
/// pool. The `identity` field is `null` when nothing matches.
pub struct IdResolve;

#[async_trait]
impl CapabilityHandler for IdResolve {
    async fn invoke(
        &self,
        args: &serde_json::Value,
        ctx: &CapabilityContext,
    ) -> Result<serde_json::Value, EngineError> {
        let alias = args
            .get("alias")
            .and_then(|value| value.as_str())
            .ok_or_else(|| {
                EngineError::invalid_argument("id.resolve", "missing string field `alias`")
            })?;
        let identity = ctx.pool.resolve_alias(alias).await?;
        Ok(json!({
            "alias": alias,
            "identity": identity.as_ref().map(|id| id.as_str()),
        }))
    }
}
