//! Follow-graph capabilities.

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::json;

use crate::context::CapabilityContext;
use crate::error::EngineError;
use crate::handlers::identity_field;
use crate::registry::CapabilityHandler;

/// `graph.distance {from?, to?}`: hop count along follow edges, `null`
/// when unreachable. `from` defaults to the evaluation source, `to` to
/// the target.
///
/// Distinct arguments can normalize to the same endpoint pair (an omitted
/// field versus its explicit default), so the walk is memoized in the
/// run's side cache under the normalized pair.
pub struct GraphDistance;

#[async_trait]
impl CapabilityHandler for GraphDistance {
    async fn invoke(
        &self,
        args: &serde_json::Value,
        ctx: &CapabilityContext,
    ) -> Result<serde_json::Value, EngineError> {
        let from = identity_field(args, "from")
            .or_else(|| ctx.source.clone())
            .ok_or_else(|| {
                EngineError::invalid_argument(
                    "graph.distance",
                    "no `from` field and the evaluation has no source",
                )
            })?;
        let to = identity_field(args, "to").unwrap_or_else(|| ctx.target.clone());

        let cache_key = format!("graph.distance:{}->{}", from, to);
        if let Some(cached) = ctx.cache.get(&cache_key) {
            return Ok(cached);
        }

        let hops = ctx.graph.distance(&from, &to);
        let response = json!({
            "from": from.as_str(),
            "to": to.as_str(),
            "hops": hops,
        });
        ctx.cache.put(cache_key, response.clone());
        Ok(response)
    }
}

/// `graph.follower_count {id?}`: how many identities follow the subject.
pub struct GraphFollowerCount;

#[async_trait]
impl CapabilityHandler for GraphFollowerCount {
    async fn invoke(
        &self,
        args: &serde_json::Value,
        ctx: &CapabilityContext,
    ) -> Result<serde_json::Value, EngineError> {
        let id = identity_field(args, "id").unwrap_or_else(|| ctx.target.clone());
        let count = ctx.graph.followers(&id).len();
        Ok(json!({ "id": id.as_str(), "count": count }))
    }
}

/// `graph.mutuals {a?, b?}`: how many identities both subjects follow.
/// `a` defaults to the evaluation source, `b` to the target.
pub struct GraphMutuals;

#[async_trait]
impl CapabilityHandler for GraphMutuals {
    async fn invoke(
        &self,
        args: &serde_json::Value,
        ctx: &CapabilityContext,
    ) -> Result<serde_json::Value, EngineError> {
        let a = identity_field(args, "a")
            .or_else(|| ctx.source.clone())
            .ok_or_else(|| {
                EngineError::invalid_argument(
                    "graph.mutuals",
                    "no `a` field and the evaluation has no source",
                )
            })?;
        let b = identity_field(args, "b").unwrap_or_else(|| ctx.target.clone());
        let followed_by_a: HashSet<_> = ctx.graph.follows(&a).into_iter().collect();
        let count = ctx
            .graph
            .follows(&b)
            .into_iter()
            .filter(|id| followed_by_a.contains(id))
            .count();
        Ok(json!({ "a": a.as_str(), "b": b.as_str(), "count": count }))
    }
}
