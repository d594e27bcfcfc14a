//! Configuration loading from disk and layering into the enablement
//! policy.

use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use trustnet::{EnablementPolicy, EngineConfig, EngineError};

#[test]
fn test_load_config_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[policy]
max_rounds = 3
max_calls_per_round = 4
plugin_timeout_ms = 2000

[capabilities]
"cap.echo" = false
"#
    )
    .unwrap();

    let config = EngineConfig::from_path(file.path()).unwrap();
    let policy = config.engine_policy();
    assert_eq!(policy.max_rounds, 3);
    assert_eq!(policy.max_calls_per_round, 4);
    assert_eq!(policy.plugin_timeout, Duration::from_millis(2000));
    assert_eq!(policy.max_total_calls, 16);

    let enablement = EnablementPolicy::from_layers(&config.capabilities);
    assert_eq!(enablement.decide("cap.echo"), Some(false));
    assert_eq!(enablement.decide("graph.distance"), Some(true));
}

#[test]
fn test_missing_config_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.toml");
    let err = EngineConfig::from_path(&path).unwrap_err();
    assert!(matches!(err, EngineError::Io(_)));
}

#[test]
fn test_environment_switch_layers_over_config() {
    std::env::set_var("TRUSTNET_CAP_ID_RESOLVE", "off");
    let enablement = EnablementPolicy::from_layers(&HashMap::new());
    std::env::remove_var("TRUSTNET_CAP_ID_RESOLVE");
    assert_eq!(enablement.decide("id.resolve"), Some(false));
}

#[test]
fn test_runtime_override_beats_config() {
    let mut capabilities = HashMap::new();
    capabilities.insert("cap.echo".to_string(), false);
    let enablement = EnablementPolicy::from_layers(&capabilities);
    assert!(!enablement.allows("cap.echo"));

    enablement.set_override("cap.echo", true);
    assert!(enablement.allows("cap.echo"));
}
