//! Capability catalog and enablement policy.
//!
//! Responsibilities:
//! - Hold the static table of capabilities the engine ships with, each
//!   with its environment switch and default state
//! - Resolve whether a named capability may execute, layering runtime
//!   overrides over environment variables over config-file entries over
//!   catalog defaults
//!
//! The environment is read once when the policy is built, never at call
//! time; tests and operators flip capabilities afterwards through the
//! runtime override map.

use std::collections::HashMap;
use std::sync::Mutex;

use lazy_static::lazy_static;

/// One catalog row.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub env_key: &'static str,
    pub default_enabled: bool,
    pub description: &'static str,
}

lazy_static! {
    /// Capabilities the engine knows about without registration.
    pub static ref BUILTIN_CATALOG: Vec<CatalogEntry> = vec![
        CatalogEntry {
            name: "graph.distance",
            env_key: "TRUSTNET_CAP_GRAPH_DISTANCE",
            default_enabled: true,
            description: "Hop distance between two identities along follow edges",
        },
        CatalogEntry {
            name: "graph.follower_count",
            env_key: "TRUSTNET_CAP_GRAPH_FOLLOWER_COUNT",
            default_enabled: true,
            description: "Number of identities following the subject",
        },
        CatalogEntry {
            name: "graph.mutuals",
            env_key: "TRUSTNET_CAP_GRAPH_MUTUALS",
            default_enabled: true,
            description: "Count of identities two subjects both follow",
        },
        CatalogEntry {
            name: "relay.presence",
            env_key: "TRUSTNET_CAP_RELAY_PRESENCE",
            default_enabled: true,
            description: "Relays that carry the subject",
        },
        CatalogEntry {
            name: "id.resolve",
            env_key: "TRUSTNET_CAP_ID_RESOLVE",
            default_enabled: true,
            description: "Resolve an external alias to an identity",
        },
        CatalogEntry {
            name: "cap.echo",
            env_key: "TRUSTNET_CAP_ECHO",
            default_enabled: true,
            description: "Echo the argument back, for diagnostics and tests",
        },
    ];
}

/// Catalog row for a capability name, if the engine ships one.
pub fn catalog_entry(name: &str) -> Option<&'static CatalogEntry> {
    BUILTIN_CATALOG.iter().find(|entry| entry.name == name)
}

/// Decides whether a capability may execute.
///
/// The config-file and environment layers are folded into `configured` at
/// construction. Runtime overrides are the only mutable layer and take
/// precedence over everything.
#[derive(Debug, Default)]
pub struct EnablementPolicy {
    configured: HashMap<String, bool>,
    overrides: Mutex<HashMap<String, bool>>,
}

impl EnablementPolicy {
    /// Catalog defaults only.
    pub fn from_catalog() -> Self {
        let configured = BUILTIN_CATALOG
            .iter()
            .map(|entry| (entry.name.to_string(), entry.default_enabled))
            .collect();
        EnablementPolicy {
            configured,
            overrides: Mutex::new(HashMap::new()),
        }
    }

    /// Catalog defaults, then config-file entries, then the process
    /// environment switches named in the catalog.
    pub fn from_layers(config: &HashMap<String, bool>) -> Self {
        let mut policy = Self::from_catalog();
        for (name, enabled) in config {
            policy.configured.insert(name.clone(), *enabled);
        }
        for entry in BUILTIN_CATALOG.iter() {
            if let Ok(raw) = std::env::var(entry.env_key) {
                match parse_switch(&raw) {
                    Some(enabled) => {
                        policy.configured.insert(entry.name.to_string(), enabled);
                    }
                    None => {
                        log::warn!("ignoring unparseable {}={}", entry.env_key, raw);
                    }
                }
            }
        }
        policy
    }

    /// Force a capability on or off, overriding every configured layer.
    pub fn set_override(&self, name: &str, enabled: bool) {
        if let Ok(mut overrides) = self.overrides.lock() {
            overrides.insert(name.to_string(), enabled);
        }
    }

    pub fn clear_override(&self, name: &str) {
        if let Ok(mut overrides) = self.overrides.lock() {
            overrides.remove(name);
        }
    }

    /// Explicit decision for this capability, `None` when every layer is
    /// silent. Callers treat silence as "enabled if a handler exists".
    pub fn decide(&self, name: &str) -> Option<bool> {
        if let Ok(overrides) = self.overrides.lock() {
            if let Some(enabled) = overrides.get(name) {
                return Some(*enabled);
            }
        }
        self.configured.get(name).copied()
    }

    /// `decide` collapsed to the executor's default.
    pub fn allows(&self, name: &str) -> bool {
        self.decide(name).unwrap_or(true)
    }
}

/// Accepts `1`/`true`/`on`/`yes` and `0`/`false`/`off`/`no`, case
/// insensitive.
fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lists_builtins() {
        assert!(catalog_entry("cap.echo").is_some());
        assert!(catalog_entry("graph.distance").is_some());
        assert!(catalog_entry("cap.unknown").is_none());
    }

    #[test]
    fn test_parse_switch_variants() {
        assert_eq!(parse_switch("1"), Some(true));
        assert_eq!(parse_switch("ON"), Some(true));
        assert_eq!(parse_switch(" yes "), Some(true));
        assert_eq!(parse_switch("0"), Some(false));
        assert_eq!(parse_switch("Off"), Some(false));
        assert_eq!(parse_switch("maybe"), None);
    }

    #[test]
    fn test_catalog_defaults_enable_builtins() {
        let policy = EnablementPolicy::from_catalog();
        assert_eq!(policy.decide("cap.echo"), Some(true));
        assert!(policy.allows("cap.echo"));
    }

    #[test]
    fn test_unknown_capability_defaults_to_registered() {
        let policy = EnablementPolicy::from_catalog();
        assert_eq!(policy.decide("custom.metric"), None);
        assert!(policy.allows("custom.metric"));
    }

    #[test]
    fn test_override_beats_configured_layers() {
        let policy = EnablementPolicy::from_catalog();
        policy.set_override("cap.echo", false);
        assert_eq!(policy.decide("cap.echo"), Some(false));
        assert!(!policy.allows("cap.echo"));

        policy.clear_override("cap.echo");
        assert_eq!(policy.decide("cap.echo"), Some(true));
    }

    #[test]
    fn test_config_layer_beats_catalog_default() {
        let mut config = HashMap::new();
        config.insert("relay.presence".to_string(), false);
        let policy = EnablementPolicy::from_layers(&config);
        assert_eq!(policy.decide("relay.presence"), Some(false));
        assert_eq!(policy.decide("cap.echo"), Some(true));
    }
}
