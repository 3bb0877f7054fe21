mod builtins;

use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

use crate::value::Value;

/// Signature of a formatter: the incoming value plus literal arguments.
pub type FormatterFn = dyn Fn(&Value, &[Value]) -> Value + Send + Sync;

/// Registry of named formatters used by `field|name(args)` pipelines.
///
/// Formatters are looked up by exact name each time a pipeline runs, so
/// registering (or re-registering) a name affects every later lookup.
pub struct Formatters {
    registry: DashMap<String, Arc<FormatterFn>, FxBuildHasher>,
}

impl Formatters {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: DashMap::with_hasher(FxBuildHasher),
        }
    }

    /// A registry preloaded with the built-in formatters.
    #[must_use]
    pub fn with_builtins() -> Self {
        let formatters = Self::new();
        builtins::register_all(&formatters);
        formatters
    }

    pub fn register<F>(&self, name: impl Into<String>, formatter: F)
    where
        F: Fn(&Value, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.registry.insert(name.into(), Arc::new(formatter));
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registry.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Run the formatter called `name`. Unknown names pass `value` through.
    #[must_use]
    pub fn apply(&self, name: &str, value: &Value, args: &[Value]) -> Value {
        // Clone the handle out so the shard lock is released before the
        // formatter runs; formatters may register other formatters.
        let formatter = self.registry.get(name).map(|entry| Arc::clone(entry.value()));
        match formatter {
            Some(formatter) => formatter(value, args),
            None => {
                tracing::debug!(formatter = name, "unknown formatter, passing value through");
                value.clone()
            }
        }
    }
}

impl Default for Formatters {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for Formatters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Formatters")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_formatter_passes_through() {
        let formatters = Formatters::new();
        let value = Value::from("keep");
        assert_eq!(formatters.apply("missing", &value, &[]), value);
    }

    #[test]
    fn registered_formatter_receives_arguments() {
        let formatters = Formatters::new();
        formatters.register("add", |value, args| {
            let base = value.as_i64().unwrap_or(0);
            Value::Int(args.iter().filter_map(Value::as_i64).sum::<i64>() + base)
        });
        let out = formatters.apply("add", &Value::Int(1), &[Value::Int(2), Value::Int(3)]);
        assert_eq!(out, Value::Int(6));
    }

    #[test]
    fn reregistration_replaces_formatter() {
        let formatters = Formatters::new();
        formatters.register("f", |_, _| Value::from("one"));
        formatters.register("f", |_, _| Value::from("two"));
        assert_eq!(formatters.apply("f", &Value::Null, &[]), Value::from("two"));
        assert!(formatters.contains("f"));
    }

    #[test]
    fn builtins_are_registered() {
        let formatters = Formatters::with_builtins();
        for name in ["upper", "lower", "default", "currency", "truncate", "json"] {
            assert!(formatters.contains(name), "missing builtin {name}");
        }
        assert!(Formatters::new().names().is_empty());
    }
}
