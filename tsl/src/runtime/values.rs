// Runtime value system for TSL
// Represents values during evaluation (different from AST which represents parsed code)

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Temporal values stay outside the JSON value space on purpose:
    /// arguments containing one can never form a request key.
    Timestamp(DateTime<Utc>),
    Array(Vec<Value>),
    Object(HashMap<String, Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Timestamp(t) => {
                write!(f, "#timestamp(\"{}\")", t.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::Array(items) => {
                let items: Vec<String> = items.iter().map(|item| format!("{}", item)).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Object(entries) => {
                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();
                let items: Vec<String> = keys
                    .into_iter()
                    .map(|k| format!("{}: {}", k, entries[k]))
                    .collect();
                write!(f, "{{{}}}", items.join(", "))
            }
        }
    }
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Null => false,
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Timestamp(_) => "timestamp",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Numeric view used by scoring. Integers widen; everything else is
    /// not a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Convert to JSON. Returns `None` when the value has no JSON
    /// representation: timestamps anywhere in the tree, or non-finite
    /// floats. serde_json's map keeps keys sorted, which is what makes the
    /// serialized form canonical.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Value::Null => Some(serde_json::Value::Null),
            Value::Bool(b) => Some(serde_json::Value::Bool(*b)),
            Value::Integer(i) => Some(serde_json::Value::Number((*i).into())),
            Value::Float(f) => serde_json::Number::from_f64(*f).map(serde_json::Value::Number),
            Value::String(s) => Some(serde_json::Value::String(s.clone())),
            Value::Timestamp(_) => None,
            Value::Array(items) => items
                .iter()
                .map(Value::to_json)
                .collect::<Option<Vec<_>>>()
                .map(serde_json::Value::Array),
            Value::Object(entries) => {
                let mut map = serde_json::Map::new();
                for (k, v) in entries {
                    map.insert(k.clone(), v.to_json()?);
                }
                Some(serde_json::Value::Object(map))
            }
        }
    }

    /// Convert from JSON; total. Numbers become `Integer` when they fit in
    /// i64, otherwise `Float`.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_follows_null_and_false() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Integer(0).is_truthy());
        assert!(Value::Float(0.0).is_truthy());
        assert!(Value::String(String::new()).is_truthy());
        assert!(Value::Array(vec![]).is_truthy());
    }

    #[test]
    fn to_json_rejects_timestamps_anywhere() {
        let ts = Value::Timestamp(Utc::now());
        assert_eq!(ts.to_json(), None);

        let nested = Value::Object(HashMap::from([(
            "at".to_string(),
            Value::Array(vec![Value::Integer(1), Value::Timestamp(Utc::now())]),
        )]));
        assert_eq!(nested.to_json(), None);
    }

    #[test]
    fn to_json_rejects_non_finite_floats() {
        assert_eq!(Value::Float(f64::NAN).to_json(), None);
        assert_eq!(Value::Float(f64::INFINITY).to_json(), None);
        assert!(Value::Float(1.5).to_json().is_some());
    }

    #[test]
    fn json_round_trip_preserves_structure() {
        let value = Value::Object(HashMap::from([
            ("n".to_string(), Value::Integer(3)),
            ("xs".to_string(), Value::Array(vec![Value::Bool(true), Value::Null])),
        ]));
        let json = value.to_json().unwrap();
        assert_eq!(Value::from_json(&json), value);
    }
}
