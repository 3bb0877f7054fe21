use std::cell::RefCell;

use rustc_hash::FxHashMap;

use crate::formatters::Formatters;
use crate::pipeline;
use crate::value::Value;

/// One frame of the render-time lookup chain.
///
/// A frame binds a single value and borrows its parent, so a chain lives on
/// the stack for exactly as long as the section that created it. Resolved
/// names are memoized per frame, misses included.
pub struct Context<'a> {
    value: Value,
    parent: Option<&'a Context<'a>>,
    cache: RefCell<FxHashMap<String, Option<Value>>>,
    formatters: &'a Formatters,
}

impl<'a> Context<'a> {
    #[must_use]
    pub fn new(value: Value, formatters: &'a Formatters) -> Self {
        Self {
            value,
            parent: None,
            cache: RefCell::default(),
            formatters,
        }
    }

    /// A child frame bound to `value` whose parent is `self`.
    #[must_use]
    pub fn push(&self, value: Value) -> Context<'_> {
        Context {
            value,
            parent: Some(self),
            cache: RefCell::default(),
            formatters: self.formatters,
        }
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Resolve `name`, running a format pipeline when the key has one.
    /// Missing names come back as `Null`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Value {
        if !pipeline::has_pipeline(name) {
            return self.resolve(name).unwrap_or_default();
        }

        let expr = pipeline::parse(name);
        let value = self.resolve(&expr.field).unwrap_or_default();
        expr.apply(value, self.formatters)
    }

    /// Resolve a plain (pipeline-free) name against this frame and its
    /// ancestors. `None` means no frame had it.
    ///
    /// `.` is the frame value itself. A name with a leading dot is looked up
    /// on this frame only.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Value> {
        if let Some(hit) = self.cache.borrow().get(name) {
            tracing::trace!(name, "context memo hit");
            return hit.clone();
        }

        let found = if name == "." {
            Some(self.value.clone())
        } else if let Some(isolated) = name.strip_prefix('.') {
            self.resolve_local(isolated)
        } else {
            self.frames().find_map(|frame| frame.resolve_local(name))
        };

        let resolved = match found {
            Some(Value::Func(getter)) => Some(getter.call(&self.value)),
            other => other,
        };

        if resolved.is_none() {
            tracing::trace!(name, "name not found in context chain");
        }

        self.cache
            .borrow_mut()
            .insert(name.to_string(), resolved.clone());
        resolved
    }

    /// Resolve `name` against this frame's value alone.
    #[must_use]
    pub fn resolve_local(&self, name: &str) -> Option<Value> {
        if let Value::Accessor(lookup) = &self.value {
            match lookup.get(name) {
                Ok(Some(value)) => return Some(value),
                Ok(None) => {}
                Err(err) => tracing::debug!(name, error = %err, "accessor lookup failed"),
            }
        }
        lookup_path(&self.value, name)
    }

    fn frames(&self) -> impl Iterator<Item = &Context<'a>> {
        std::iter::successors(Some(self), |frame| frame.parent)
    }
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("value", &self.value)
            .field("depth", &self.frames().count())
            .finish_non_exhaustive()
    }
}

/// Walk a dotted path through plain properties of `root`.
///
/// An accessor met part way down receives the rest of the path in one `get`
/// call and its answer is final.
pub(crate) fn lookup_path(root: &Value, path: &str) -> Option<Value> {
    let (head, rest) = split_segment(path);
    descend(root.property(head)?, rest)
}

/// Continue a path walk from `current` with the segments left in `rest`.
pub(crate) fn descend(mut current: Value, mut rest: Option<&str>) -> Option<Value> {
    while let Some(tail) = rest {
        if let Value::Accessor(lookup) = &current {
            return match lookup.get(tail) {
                Ok(value) => value,
                Err(err) => {
                    tracing::debug!(path = tail, error = %err, "nested accessor lookup failed");
                    None
                }
            };
        }
        let (head, next) = split_segment(tail);
        current = current.property(head)?;
        rest = next;
    }

    Some(current)
}

pub(crate) fn split_segment(path: &str) -> (&str, Option<&str>) {
    match path.split_once('.') {
        Some((head, tail)) => (head, Some(tail)),
        None => (path, None),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::value::Lookup;
    use crate::value::LookupError;

    struct Failing;

    impl Lookup for Failing {
        fn get(&self, key: &str) -> Result<Option<Value>, LookupError> {
            Err(LookupError::new(key, "boom"))
        }

        fn property(&self, name: &str) -> Option<Value> {
            (name == "plain").then(|| Value::from("structural"))
        }
    }

    struct Fixed(Option<Value>);

    impl Lookup for Fixed {
        fn get(&self, _key: &str) -> Result<Option<Value>, LookupError> {
            Ok(self.0.clone())
        }
    }

    fn data(value: serde_json::Value) -> Value {
        Value::from(value)
    }

    #[test]
    fn walks_up_to_ancestors() {
        let formatters = Formatters::new();
        let root = Context::new(data(json!({"a": 1, "b": 2})), &formatters);
        let child = root.push(data(json!({"b": 20})));
        let grandchild = child.push(data(json!({})));
        assert_eq!(grandchild.lookup("a"), Value::Int(1));
        assert_eq!(grandchild.lookup("b"), Value::Int(20));
        assert_eq!(grandchild.lookup("c"), Value::Null);
        assert_eq!(grandchild.resolve("c"), None);
    }

    #[test]
    fn dotted_paths() {
        let formatters = Formatters::new();
        let ctx = Context::new(
            data(json!({"user": {"name": "Ada", "tags": ["x", "y"]}})),
            &formatters,
        );
        assert_eq!(ctx.lookup("user.name"), Value::from("Ada"));
        assert_eq!(ctx.lookup("user.tags.1"), Value::from("y"));
        assert_eq!(ctx.lookup("user.tags.length"), Value::Int(2));
        assert_eq!(ctx.lookup("user.missing.deeper"), Value::Null);
    }

    #[test]
    fn broken_path_falls_back_to_ancestors() {
        let formatters = Formatters::new();
        let root = Context::new(data(json!({"user": {"name": "root"}})), &formatters);
        let child = root.push(data(json!({"user": {"id": 1}})));
        assert_eq!(child.lookup("user.id"), Value::Int(1));
        assert_eq!(child.lookup("user.name"), Value::from("root"));
    }

    #[test]
    fn implicit_iterator_and_isolation() {
        let formatters = Formatters::new();
        let root = Context::new(data(json!({"title": "outer"})), &formatters);
        let child = root.push(data(json!({"name": "inner"})));
        assert_eq!(child.lookup("."), data(json!({"name": "inner"})));
        assert_eq!(child.lookup(".name"), Value::from("inner"));
        assert_eq!(child.lookup("title"), Value::from("outer"));
        assert_eq!(child.lookup(".title"), Value::Null);
    }

    #[test]
    fn results_are_memoized_per_frame() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let formatters = Formatters::new();
        let ctx = Context::new(
            Value::object([(
                "count",
                Value::func(move |_| {
                    counter.set(counter.get() + 1);
                    Value::Int(7)
                }),
            )]),
            &formatters,
        );
        assert_eq!(ctx.lookup("count"), Value::Int(7));
        assert_eq!(ctx.lookup("count"), Value::Int(7));
        assert_eq!(calls.get(), 1);

        let child = ctx.push(Value::Null);
        assert_eq!(child.lookup("count"), Value::Int(7));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn getters_receive_originating_frame() {
        let formatters = Formatters::new();
        let root = Context::new(
            Value::object([(
                "shout",
                Value::func(|receiver| {
                    let name = receiver.property("name").unwrap_or_default();
                    Value::String(name.to_display_string().to_uppercase())
                }),
            )]),
            &formatters,
        );
        let child = root.push(data(json!({"name": "ada"})));
        assert_eq!(child.lookup("shout"), Value::from("ADA"));
    }

    #[test]
    fn accessor_errors_fall_through_to_structural_lookup() {
        let formatters = Formatters::new();
        let root = Context::new(data(json!({"other": "from root"})), &formatters);
        let child = root.push(Value::accessor(Failing));
        assert_eq!(child.lookup("plain"), Value::from("structural"));
        assert_eq!(child.lookup("other"), Value::from("from root"));
    }

    #[test]
    fn accessor_null_answer_is_final() {
        let formatters = Formatters::new();
        let root = Context::new(data(json!({"x": "root"})), &formatters);
        let child = root.push(Value::accessor(Fixed(Some(Value::Null))));
        assert_eq!(child.resolve("x"), Some(Value::Null));

        let not_found = root.push(Value::accessor(Fixed(None)));
        assert_eq!(not_found.lookup("x"), Value::from("root"));
    }

    #[test]
    fn intermediate_accessor_receives_remaining_path() {
        let formatters = Formatters::new();
        let ctx = Context::new(
            Value::object([("node", Value::accessor(Fixed(Some(Value::from("delegated")))))]),
            &formatters,
        );
        assert_eq!(ctx.lookup("node.any.path"), Value::from("delegated"));
    }

    #[test]
    fn pipelines_run_registered_formatters() {
        let formatters = Formatters::with_builtins();
        let ctx = Context::new(data(json!({"name": "ada"})), &formatters);
        assert_eq!(ctx.lookup("name|upper"), Value::from("ADA"));
        assert_eq!(ctx.lookup("missing|default('none')"), Value::from("none"));
        assert_eq!(ctx.lookup("name|nope"), Value::from("ada"));
    }
}
