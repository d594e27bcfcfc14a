//! Core engine types: identities, evaluation inputs, and results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tsl::{Environment, Value};

/// An identity in the social graph (a public key or other stable handle).
#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub String);

impl Identity {
    pub fn new(s: &str) -> Self {
        Identity(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Identity(s.to_string())
    }
}

/// Facts visible to plan-time evaluation for one (plugin, target) pair.
/// `now` is captured once so every plugin in a batch observes the same
/// clock reading.
#[derive(Debug, Clone)]
pub struct EvaluationInput {
    pub target: Identity,
    pub source: Option<Identity>,
    pub now: DateTime<Utc>,
}

impl EvaluationInput {
    pub fn new(target: Identity, source: Option<Identity>) -> Self {
        EvaluationInput {
            target,
            source,
            now: Utc::now(),
        }
    }

    pub fn at(target: Identity, source: Option<Identity>, now: DateTime<Utc>) -> Self {
        EvaluationInput {
            target,
            source,
            now,
        }
    }

    /// Root environment seeded with the input facts. `now` is a timestamp
    /// value, which keeps it out of capability request keys.
    pub fn environment(&self) -> Environment {
        let mut env = Environment::new();
        env.define("target", Value::String(self.target.0.clone()));
        env.define(
            "source",
            match &self.source {
                Some(source) => Value::String(source.0.clone()),
                None => Value::Null,
            },
        );
        env.define("now", Value::Timestamp(self.now));
        env
    }

    /// Child environment for one plugin's bindings.
    pub fn plugin_environment(&self) -> Environment {
        Environment::with_parent(Arc::new(self.environment()))
    }
}

/// Outcome of evaluating one plugin. Fatal failures report
/// `success: false` with a zero score; absorbed failures (unplannable
/// arguments, capability faults) leave `success: true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub plugin_id: String,
    pub plugin_name: String,
    pub score: f64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl EvaluationResult {
    pub fn failure(plugin_id: &str, plugin_name: &str, error: String, elapsed_ms: u64) -> Self {
        EvaluationResult {
            plugin_id: plugin_id.to_string(),
            plugin_name: plugin_name.to_string(),
            score: 0.0,
            success: false,
            error: Some(error),
            elapsed_ms,
        }
    }
}

/// Every plugin result for one target identity, plus the name-to-score map
/// consumers read.
#[derive(Debug, Clone, Serialize)]
pub struct IdentityReport {
    pub target: Identity,
    pub results: Vec<EvaluationResult>,
    pub scores: HashMap<String, f64>,
}

impl IdentityReport {
    pub fn new(target: Identity, results: Vec<EvaluationResult>) -> Self {
        let scores = results
            .iter()
            .map(|r| (r.plugin_name.clone(), r.score))
            .collect();
        IdentityReport {
            target,
            results,
            scores,
        }
    }
}
