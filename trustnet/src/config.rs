//! Engine configuration loading.
//!
//! A TOML file with a `[policy]` table for limits and timeouts and a
//! `[capabilities]` table of name-to-enabled entries. Environment switches
//! named in the capability catalog apply on top when the enablement policy
//! is built with `EnablementPolicy::from_layers`.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{EngineError, EngineResult};
use crate::runner::EnginePolicy;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub capabilities: HashMap<String, bool>,
}

/// `[policy]` table. Every field is optional; omitted fields keep the
/// engine defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub max_rounds: usize,
    pub max_calls_per_round: usize,
    pub max_total_calls: usize,
    pub max_source_bytes: usize,
    pub plugin_timeout_ms: u64,
    pub capability_timeout_ms: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let policy = EnginePolicy::default();
        PolicyConfig {
            max_rounds: policy.max_rounds,
            max_calls_per_round: policy.max_calls_per_round,
            max_total_calls: policy.max_total_calls,
            max_source_bytes: policy.max_source_bytes,
            plugin_timeout_ms: policy.plugin_timeout.as_millis() as u64,
            capability_timeout_ms: policy.capability_timeout.as_millis() as u64,
        }
    }
}

impl EngineConfig {
    pub fn from_path(path: &Path) -> EngineResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> EngineResult<Self> {
        toml::from_str(raw).map_err(|err| EngineError::Config(err.to_string()))
    }

    pub fn engine_policy(&self) -> EnginePolicy {
        EnginePolicy {
            max_rounds: self.policy.max_rounds,
            max_calls_per_round: self.policy.max_calls_per_round,
            max_total_calls: self.policy.max_total_calls,
            max_source_bytes: self.policy.max_source_bytes,
            plugin_timeout: Duration::from_millis(self.policy.plugin_timeout_ms),
            capability_timeout: Duration::from_millis(self.policy.capability_timeout_ms),
        }
    }
}
