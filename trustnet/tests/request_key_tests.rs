//! Canonicalization properties of request keys: every plannable value gets
//! a parseable key, re-encoding never changes it, and timestamps poison any
//! container they appear in.

use std::collections::HashMap;

use chrono::Utc;
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;

use trustnet::request_key;
use tsl::Value;

fn arb_plannable_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e9..1.0e9f64).prop_map(Value::Float),
        "[a-zA-Z0-9 _.-]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..=4).prop_map(Value::Array),
            prop::collection::hash_map("[a-z][a-z0-9_]{0,6}", inner, 0..=4)
                .prop_map(Value::Object),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        // Do not write `.proptest-regressions` files into the repo.
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_plannable_values_always_get_keys(value in arb_plannable_value()) {
        let key = request_key("cap.echo", &value);
        prop_assert!(key.is_some());
        let key = key.unwrap();
        prop_assert!(key.starts_with("cap.echo\n"));

        // The tail of the key is the canonical JSON of the argument.
        let tail = &key["cap.echo\n".len()..];
        let parsed: serde_json::Value = serde_json::from_str(tail).unwrap();
        prop_assert_eq!(parsed, value.to_json().unwrap());
    }

    #[test]
    fn prop_key_is_stable_across_reencoding(value in arb_plannable_value()) {
        let json = value.to_json().unwrap();
        let decoded = Value::from_json(&json);
        prop_assert_eq!(
            request_key("cap.echo", &value),
            request_key("cap.echo", &decoded)
        );
    }

    #[test]
    fn prop_timestamp_poisons_any_container(value in arb_plannable_value()) {
        let mut object = HashMap::new();
        object.insert("at".to_string(), Value::Timestamp(Utc::now()));
        object.insert("payload".to_string(), value.clone());
        prop_assert_eq!(request_key("cap.echo", &Value::Object(object)), None);

        let array = Value::Array(vec![value, Value::Timestamp(Utc::now())]);
        prop_assert_eq!(request_key("cap.echo", &array), None);
    }

    #[test]
    fn prop_capability_name_distinguishes_keys(value in arb_plannable_value()) {
        prop_assert_ne!(
            request_key("graph.distance", &value),
            request_key("relay.presence", &value)
        );
    }
}
