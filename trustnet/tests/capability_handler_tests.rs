//! Builtin handlers exercised through full plugin evaluations against the
//! in-memory collaborators.

use std::sync::Arc;

use trustnet::handlers::register_builtin_handlers;
use trustnet::memory::{self, MemoryRelayDirectory, MemorySocialGraph, StaticResolver};
use trustnet::{
    CapabilityExecutor, CapabilityRegistry, Collaborators, EnablementPolicy, EnginePolicy,
    Identity, Plugin, RoundRunner,
};

/// alice follows bob and carol; bob follows carol and dave; carol follows
/// dave. carol sits on two relays and owns one alias.
fn fixture() -> Collaborators {
    let mut graph = MemorySocialGraph::new();
    graph.add_follow("alice", "bob");
    graph.add_follow("alice", "carol");
    graph.add_follow("bob", "carol");
    graph.add_follow("bob", "dave");
    graph.add_follow("carol", "dave");

    let mut relays = MemoryRelayDirectory::new();
    relays.add_relay("carol", "wss://relay.one");
    relays.add_relay("carol", "wss://relay.two");

    let mut resolver = StaticResolver::new();
    resolver.insert("@carol:example.org", "carol");

    memory::collaborators(graph, relays, resolver)
}

fn builtin_runner() -> RoundRunner {
    let mut registry = CapabilityRegistry::new();
    register_builtin_handlers(&mut registry);
    let enablement = Arc::new(EnablementPolicy::from_catalog());
    let executor = Arc::new(CapabilityExecutor::new(registry, enablement));
    RoundRunner::new(executor, EnginePolicy::default())
}

async fn score(source_code: &str, target: &str, source: Option<&str>) -> f64 {
    let runner = builtin_runner();
    let report = runner
        .run_all(
            &[Plugin::new("p", "author", "p", source_code)],
            Identity::new(target),
            source.map(Identity::new),
            &fixture(),
        )
        .await;
    assert!(report.results[0].success, "{:?}", report.results[0].error);
    report.results[0].score
}

#[tokio::test]
async fn test_graph_distance_defaults_to_source_and_target() {
    // alice -> bob -> dave is the shortest path.
    let source_code = r#"
plan d = do "graph.distance" {} in
if d.hops == 2 then 1.0 else 0.0
"#;
    assert_eq!(score(source_code, "dave", Some("alice")).await, 1.0);
}

#[tokio::test]
async fn test_graph_distance_unreachable_is_null_hops() {
    let source_code = r#"
plan d = do "graph.distance" {} in
if d.hops == null then 1.0 else 0.0
"#;
    assert_eq!(score(source_code, "alice", Some("dave")).await, 1.0);
}

#[tokio::test]
async fn test_graph_distance_without_source_binds_null() {
    // No `from` field and no evaluation source: the handler rejects the
    // argument and the binding degrades to null.
    let source_code = r#"
plan d = do "graph.distance" {} in
if d == null then 1.0 else 0.0
"#;
    assert_eq!(score(source_code, "dave", None).await, 1.0);
}

#[tokio::test]
async fn test_follower_count_with_explicit_subject() {
    let source_code = r#"
plan f = do "graph.follower_count" {id: "carol"} in
if f.count == 2 then 1.0 else 0.0
"#;
    assert_eq!(score(source_code, "dave", None).await, 1.0);
}

#[tokio::test]
async fn test_mutuals_counts_shared_follows() {
    // alice follows {bob, carol}; bob follows {carol, dave}; carol is the
    // one account both follow.
    let source_code = r#"
plan m = do "graph.mutuals" {} in
if m.count == 1 then 1.0 else 0.0
"#;
    assert_eq!(score(source_code, "bob", Some("alice")).await, 1.0);
}

#[tokio::test]
async fn test_relay_presence_defaults_to_target() {
    let source_code = r#"
plan r = do "relay.presence" {} in
if r.count == 2 then 1.0 else 0.0
"#;
    assert_eq!(score(source_code, "carol", None).await, 1.0);
}

#[tokio::test]
async fn test_id_resolve_known_and_unknown_aliases() {
    let source_code = r#"
plan r = do "id.resolve" {alias: "@carol:example.org"} in
if r.identity == "carol" then 1.0 else 0.0
"#;
    assert_eq!(score(source_code, "carol", None).await, 1.0);

    let source_code = r#"
plan r = do "id.resolve" {alias: "@nobody:example.org"} in
if r.identity == null then 1.0 else 0.0
"#;
    assert_eq!(score(source_code, "carol", None).await, 1.0);
}

#[tokio::test]
async fn test_composite_scoring_program() {
    // Proximity from the follow graph plus audience and relay presence,
    // staged over two rounds.
    let source_code = r#"
plan
  d = do "graph.distance" {} in
  f = do "graph.follower_count" {} in
then
  r = do "relay.presence" {id: target} in
let proximity = if d.hops == null then 0.0 else if d.hops <= 2 then 0.6 else 0.2 in
let audience = if f.count >= 2 then 0.2 else 0.0 in
let presence = if r.count >= 1 then 0.2 else 0.0 in
proximity + audience + presence
"#;
    let result = score(source_code, "carol", Some("alice")).await;
    assert!((result - 1.0).abs() < 1e-9);
}
