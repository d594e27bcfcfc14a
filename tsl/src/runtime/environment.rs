// Environment for variable bindings and scope management

use crate::runtime::values::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Scope chain for name lookups during plan-time evaluation. The engine
/// seeds a root environment with the evaluation facts and defines plugin
/// bindings in a child; `let` expressions add further children.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    parent: Option<Arc<Environment>>,
    bindings: HashMap<String, Value>,
}

impl Environment {
    /// Creates a new, empty root environment.
    pub fn new() -> Self {
        Environment {
            parent: None,
            bindings: HashMap::new(),
        }
    }

    /// Creates a new child environment that inherits from a parent.
    pub fn with_parent(parent: Arc<Environment>) -> Self {
        Environment {
            parent: Some(parent),
            bindings: HashMap::new(),
        }
    }

    /// Looks up a name by searching the current environment and then its parents.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.get(name) {
            Some(value.clone())
        } else if let Some(parent) = &self.parent {
            parent.lookup(name)
        } else {
            None
        }
    }

    /// Defines a new binding or overwrites an existing one in the current scope.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_parent_chain() {
        let mut root = Environment::new();
        root.define("target", Value::String("alice".to_string()));
        let mut child = Environment::with_parent(Arc::new(root));
        child.define("a", Value::Integer(1));

        assert_eq!(child.lookup("a"), Some(Value::Integer(1)));
        assert_eq!(child.lookup("target"), Some(Value::String("alice".to_string())));
        assert_eq!(child.lookup("missing"), None);
    }

    #[test]
    fn define_shadows_parent_binding() {
        let mut root = Environment::new();
        root.define("x", Value::Integer(1));
        let mut child = Environment::with_parent(Arc::new(root));
        child.define("x", Value::Integer(2));

        assert_eq!(child.lookup("x"), Some(Value::Integer(2)));
    }
}
