//! TrustNet: a capability-gated trust scoring engine.
//!
//! Plugins are untrusted TSL programs that compute a trust score in
//! [0, 1] for a target identity. The engine compiles each plugin, runs
//! its rounds through a planning store that deduplicates capability
//! requests, batches each round's calls through the executor, and clamps
//! the score. External systems are only reachable through registered
//! capability handlers behind the enablement policy.

pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod handlers;
pub mod memory;
pub mod planning;
pub mod plugin;
pub mod registry;
pub mod runner;
pub mod types;

pub use catalog::{catalog_entry, CatalogEntry, EnablementPolicy, BUILTIN_CATALOG};
pub use config::{EngineConfig, PolicyConfig};
pub use context::{
    CapabilityContext, Collaborators, NetworkPool, RelayDirectory, SideCache, SocialGraph,
};
pub use error::{EngineError, EngineResult};
pub use executor::{CapabilityExecutor, CapabilityRequest, CapabilityResponse};
pub use planning::{key_for_json, request_key, PlanningStore};
pub use plugin::{Plugin, PluginMetadata, ProgramCache};
pub use registry::{CapabilityHandler, CapabilityRegistry};
pub use runner::{EnginePolicy, RoundRunner};
pub use types::{EvaluationInput, EvaluationResult, Identity, IdentityReport};
