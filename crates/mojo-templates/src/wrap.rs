//! Recursive wrapping of plain data into lookup-capable nodes.
//!
//! A wrapped object answers `get("field.path|formatter(args)")` itself, with
//! the same splitting rules the render context uses. Wrapping stops after a
//! fixed number of levels; anything deeper stays plain data.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::context::descend;
use crate::context::split_segment;
use crate::formatters::Formatters;
use crate::pipeline;
use crate::value::Lookup;
use crate::value::LookupError;
use crate::value::Value;

/// Levels wrapped when no explicit depth is given.
pub const DEFAULT_WRAP_DEPTH: usize = 3;

/// Wrap `value` up to `depth` levels deep.
///
/// Values that are not objects or arrays, values that already resolve keys
/// themselves, and everything once `depth` reaches zero come back unchanged.
/// Arrays stay arrays, with each element wrapped one level down.
#[must_use]
pub fn wrap(value: &Value, depth: usize, formatters: &Arc<Formatters>) -> Value {
    if depth == 0 {
        return value.clone();
    }

    match value {
        Value::Array(items) => {
            Value::array(items.iter().map(|item| wrap(item, depth - 1, formatters)))
        }
        Value::Object(map) => {
            let fields = map
                .iter()
                .map(|(key, item)| (key.clone(), wrap(item, depth - 1, formatters)))
                .collect();
            Value::accessor(DataNode {
                fields,
                formatters: Arc::clone(formatters),
            })
        }
        _ => value.clone(),
    }
}

/// An object whose own properties answer pipeline-aware lookups.
pub struct DataNode {
    fields: BTreeMap<String, Value>,
    formatters: Arc<Formatters>,
}

impl DataNode {
    fn resolve_field(&self, path: &str) -> Option<Value> {
        let path = path.strip_prefix('.').unwrap_or(path);
        if path.is_empty() {
            return self.snapshot();
        }
        let (head, rest) = split_segment(path);
        descend(self.fields.get(head)?.clone(), rest)
    }
}

impl Lookup for DataNode {
    /// Own properties only; a missing field is "not found here" so the
    /// render context keeps searching outer frames. Formatters still run on
    /// a missing field, as `null`.
    fn get(&self, key: &str) -> Result<Option<Value>, LookupError> {
        let expr = pipeline::parse(key);
        let found = self.resolve_field(&expr.field);

        if !expr.has_steps() {
            return Ok(found);
        }

        let value = match found {
            Some(Value::Func(getter)) => getter.call(&self.snapshot().unwrap_or_default()),
            Some(value) => value,
            None => Value::Null,
        };
        Ok(Some(expr.apply(value, &self.formatters)))
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }

    fn snapshot(&self) -> Option<Value> {
        Some(Value::from(self.fields.clone()))
    }
}

impl fmt::Debug for DataNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataNode")
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::context::Context;

    fn formatters() -> Arc<Formatters> {
        Arc::new(Formatters::with_builtins())
    }

    fn get(value: &Value, key: &str) -> Option<Value> {
        match value {
            Value::Accessor(lookup) => lookup.get(key).ok().flatten(),
            other => panic!("expected an accessor, got {other:?}"),
        }
    }

    #[test]
    fn scalars_and_callables_are_untouched() {
        let formatters = formatters();
        for value in [Value::Int(1), Value::from("s"), Value::Null, Value::func(|_| Value::Null)] {
            assert_eq!(wrap(&value, 3, &formatters), value);
        }
    }

    #[test]
    fn wrapping_is_idempotent() {
        let formatters = formatters();
        let once = wrap(&Value::from(json!({"a": 1})), 3, &formatters);
        let twice = wrap(&once, 3, &formatters);
        assert_eq!(once, twice);
    }

    #[test]
    fn arrays_stay_arrays() {
        let formatters = formatters();
        let wrapped = wrap(&Value::from(json!([{"a": 1}, 2])), 3, &formatters);
        let items = wrapped.as_array().expect("array");
        assert!(matches!(items[0], Value::Accessor(_)));
        assert_eq!(items[1], Value::Int(2));
    }

    #[test]
    fn get_resolves_own_paths() {
        let formatters = formatters();
        let node = wrap(
            &Value::from(json!({"user": {"name": "ada", "langs": ["rust", "ml"]}})),
            3,
            &formatters,
        );
        assert_eq!(get(&node, "user.name"), Some(Value::from("ada")));
        assert_eq!(get(&node, "user.langs.0"), Some(Value::from("rust")));
        assert_eq!(get(&node, ".user.name"), Some(Value::from("ada")));
        assert_eq!(get(&node, "nobody"), None);
    }

    #[test]
    fn get_applies_formatters_even_when_missing() {
        let formatters = formatters();
        let node = wrap(&Value::from(json!({"name": "ada"})), 3, &formatters);
        assert_eq!(get(&node, "name|upper"), Some(Value::from("ADA")));
        assert_eq!(get(&node, "nobody|default('x')"), Some(Value::from("x")));
        assert_eq!(get(&node, "nobody|upper"), Some(Value::Null));
    }

    #[test]
    fn depth_bounds_wrapping() {
        let formatters = formatters();
        let data = Value::from(json!({"a": {"b": {"c": {"d": 1}}}}));
        let wrapped = wrap(&data, 2, &formatters);
        let a = wrapped.property("a").expect("a");
        assert!(matches!(a, Value::Accessor(_)));
        let b = a.property("b").expect("b");
        assert!(matches!(b, Value::Object(_)));
        assert_eq!(get(&wrapped, "a.b.c.d"), Some(Value::Int(1)));
    }

    #[test]
    fn pipeline_matches_context_lookup() {
        let formatters = formatters();
        let data = Value::from(json!({"price": 1234.5, "name": "ada lovelace"}));
        let node = wrap(&data, 3, &formatters);
        let ctx = Context::new(data, &formatters);
        for key in ["price|currency('€', 1)", "name|title|truncate(4)", "name"] {
            assert_eq!(get(&node, key), Some(ctx.lookup(key)), "key {key}");
        }
    }

    #[test]
    fn snapshot_serializes_as_plain_object() {
        let formatters = formatters();
        let node = wrap(&Value::from(json!({"a": {"b": [1, 2]}})), 3, &formatters);
        assert_eq!(node.to_json(), json!({"a": {"b": [1, 2]}}));
        assert_eq!(node.to_display_string(), r#"{"a":{"b":[1,2]}}"#);
    }
}
