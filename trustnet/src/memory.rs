//! In-memory collaborators for tests and the CLI.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::{Collaborators, NetworkPool, RelayDirectory, SocialGraph};
use crate::error::EngineError;
use crate::types::Identity;

/// Follow graph held in memory. Distance is a breadth-first walk over
/// directed follow edges.
#[derive(Debug, Clone, Default)]
pub struct MemorySocialGraph {
    follows: HashMap<Identity, Vec<Identity>>,
}

impl MemorySocialGraph {
    pub fn new() -> Self {
        MemorySocialGraph::default()
    }

    pub fn add_follow(&mut self, from: &str, to: &str) {
        let entry = self.follows.entry(Identity::new(from)).or_default();
        let to = Identity::new(to);
        if !entry.contains(&to) {
            entry.push(to);
        }
    }
}

impl SocialGraph for MemorySocialGraph {
    fn distance(&self, from: &Identity, to: &Identity) -> Option<u32> {
        if from == to {
            return Some(0);
        }
        let mut visited: HashSet<&Identity> = HashSet::new();
        let mut queue: VecDeque<(&Identity, u32)> = VecDeque::new();
        visited.insert(from);
        queue.push_back((from, 0));
        while let Some((current, hops)) = queue.pop_front() {
            for next in self.follows.get(current).into_iter().flatten() {
                if next == to {
                    return Some(hops + 1);
                }
                if visited.insert(next) {
                    queue.push_back((next, hops + 1));
                }
            }
        }
        None
    }

    fn follows(&self, who: &Identity) -> Vec<Identity> {
        self.follows.get(who).cloned().unwrap_or_default()
    }

    fn followers(&self, whom: &Identity) -> Vec<Identity> {
        let mut result: Vec<Identity> = self
            .follows
            .iter()
            .filter(|(_, followed)| followed.contains(whom))
            .map(|(follower, _)| follower.clone())
            .collect();
        result.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        result
    }
}

/// Relay membership map.
#[derive(Debug, Clone, Default)]
pub struct MemoryRelayDirectory {
    relays: HashMap<Identity, Vec<String>>,
}

impl MemoryRelayDirectory {
    pub fn new() -> Self {
        MemoryRelayDirectory::default()
    }

    pub fn add_relay(&mut self, identity: &str, relay: &str) {
        let entry = self.relays.entry(Identity::new(identity)).or_default();
        if !entry.iter().any(|r| r == relay) {
            entry.push(relay.to_string());
        }
    }
}

impl RelayDirectory for MemoryRelayDirectory {
    fn relays_for(&self, identity: &Identity) -> Vec<String> {
        self.relays.get(identity).cloned().unwrap_or_default()
    }
}

/// Fixed alias table standing in for a remote resolver.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    aliases: HashMap<String, Identity>,
}

impl StaticResolver {
    pub fn new() -> Self {
        StaticResolver::default()
    }

    pub fn insert(&mut self, alias: &str, identity: &str) {
        self.aliases
            .insert(alias.to_string(), Identity::new(identity));
    }
}

#[async_trait]
impl NetworkPool for StaticResolver {
    async fn resolve_alias(&self, alias: &str) -> Result<Option<Identity>, EngineError> {
        Ok(self.aliases.get(alias).cloned())
    }
}

/// Bundle the in-memory collaborators for wiring into an engine.
pub fn collaborators(
    graph: MemorySocialGraph,
    relays: MemoryRelayDirectory,
    resolver: StaticResolver,
) -> Collaborators {
    Collaborators {
        graph: Arc::new(graph),
        pool: Arc::new(resolver),
        relays: Arc::new(relays),
    }
}

/// Empty collaborators, enough for plugins that make no graph calls.
pub fn empty_collaborators() -> Collaborators {
    collaborators(
        MemorySocialGraph::new(),
        MemoryRelayDirectory::new(),
        StaticResolver::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_walks_follow_edges() {
        let mut graph = MemorySocialGraph::new();
        graph.add_follow("alice", "bob");
        graph.add_follow("bob", "carol");
        graph.add_follow("carol", "dave");

        let alice = Identity::new("alice");
        assert_eq!(graph.distance(&alice, &alice), Some(0));
        assert_eq!(graph.distance(&alice, &Identity::new("bob")), Some(1));
        assert_eq!(graph.distance(&alice, &Identity::new("dave")), Some(3));
        assert_eq!(graph.distance(&Identity::new("dave"), &alice), None);
    }

    #[test]
    fn test_distance_handles_cycles() {
        let mut graph = MemorySocialGraph::new();
        graph.add_follow("a", "b");
        graph.add_follow("b", "a");
        graph.add_follow("b", "c");
        assert_eq!(
            graph.distance(&Identity::new("a"), &Identity::new("c")),
            Some(2)
        );
        assert_eq!(
            graph.distance(&Identity::new("a"), &Identity::new("missing")),
            None
        );
    }

    #[test]
    fn test_followers_are_sorted() {
        let mut graph = MemorySocialGraph::new();
        graph.add_follow("zoe", "carol");
        graph.add_follow("abe", "carol");
        let followers = graph.followers(&Identity::new("carol"));
        assert_eq!(followers, vec![Identity::new("abe"), Identity::new("zoe")]);
    }

    #[tokio::test]
    async fn test_static_resolver() {
        let mut resolver = StaticResolver::new();
        resolver.insert("@alice:example.org", "alice");
        assert_eq!(
            resolver.resolve_alias("@alice:example.org").await.unwrap(),
            Some(Identity::new("alice"))
        );
        assert_eq!(resolver.resolve_alias("@nobody").await.unwrap(), None);
    }
}
