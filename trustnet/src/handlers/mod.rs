//! Reference capability handlers.
//!
//! Thin glue from JSON arguments to the collaborator seams. Argument
//! fields that name identities are optional where the evaluation input
//! provides a sensible default (`from` defaults to the source, subjects
//! default to the target).

pub mod graph;
pub mod ident;
pub mod relay;
pub mod testing;

use std::sync::Arc;

use crate::registry::CapabilityRegistry;
use crate::types::Identity;

/// Register every builtin handler under its catalog name.
pub fn register_builtin_handlers(registry: &mut CapabilityRegistry) {
    registry.register("graph.distance", Arc::new(graph::GraphDistance));
    registry.register("graph.follower_count", Arc::new(graph::GraphFollowerCount));
    registry.register("graph.mutuals", Arc::new(graph::GraphMutuals));
    registry.register("relay.presence", Arc::new(relay::RelayPresence));
    registry.register("id.resolve", Arc::new(ident::IdResolve));
    registry.register("cap.echo", Arc::new(testing::Echo));
}

/// String field from a JSON object argument, as an identity.
pub(crate) fn identity_field(args: &serde_json::Value, field: &str) -> Option<Identity> {
    args.get(field)
        .and_then(|value| value.as_str())
        .map(Identity::new)
}
