//! The data model templates are rendered against.
//!
//! Plain data (`Null` through `Object`) converts from `serde_json::Value`.
//! Three variants carry behavior and are distinguished up front instead of
//! being probed for at lookup time:
//!
//! - [`Value::Func`]: a getter, called eagerly with the frame value as
//!   receiver whenever a lookup lands on it.
//! - [`Value::Lambda`]: a section handler, called with the raw section body
//!   and a render callback.
//! - [`Value::Accessor`]: a lookup-capable value implementing [`Lookup`].

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::ser::SerializeMap;
use serde::ser::SerializeSeq;
use serde::Serialize;
use serde::Serializer;
use thiserror::Error;

/// Error raised by a [`Lookup`] implementation.
///
/// The context chain treats it as "no result" and keeps resolving.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("lookup of '{key}' failed: {message}")]
pub struct LookupError {
    pub key: String,
    pub message: String,
}

impl LookupError {
    #[must_use]
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// A value that resolves keys itself.
pub trait Lookup {
    /// Resolve `key`, which may be a dotted path and may carry a format
    /// pipeline. `Ok(None)` means "not found here".
    fn get(&self, key: &str) -> Result<Option<Value>, LookupError>;

    /// Plain own-property access used by structural path walking.
    fn property(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Plain-data view of this value for display and serialization.
    fn snapshot(&self) -> Option<Value> {
        None
    }
}

#[derive(Clone)]
pub struct Func(Rc<dyn Fn(&Value) -> Value>);

impl Func {
    pub fn call(&self, receiver: &Value) -> Value {
        (self.0)(receiver)
    }
}

#[derive(Clone)]
pub struct Lambda(Rc<dyn Fn(&str, &dyn Fn(&str) -> String) -> Value>);

impl Lambda {
    pub fn call(&self, text: &str, render: &dyn Fn(&str) -> String) -> Value {
        (self.0)(text, render)
    }
}

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Rc<Vec<Value>>),
    Object(Rc<BTreeMap<String, Value>>),
    Func(Func),
    Lambda(Lambda),
    Accessor(Rc<dyn Lookup>),
}

impl Value {
    /// A getter invoked with the bound value of the frame the lookup started
    /// from.
    pub fn func(f: impl Fn(&Value) -> Value + 'static) -> Self {
        Value::Func(Func(Rc::new(f)))
    }

    /// A section lambda receiving the unrendered body and a render callback.
    pub fn lambda(f: impl Fn(&str, &dyn Fn(&str) -> String) -> Value + 'static) -> Self {
        Value::Lambda(Lambda(Rc::new(f)))
    }

    pub fn accessor(lookup: impl Lookup + 'static) -> Self {
        Value::Accessor(Rc::new(lookup))
    }

    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(Rc::new(items.into_iter().collect()))
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(Rc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// JavaScript truthiness: `null`, `false`, `0`, `NaN` and `""` are falsy.
    /// Empty arrays and objects are truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_)
            | Value::Object(_)
            | Value::Func(_)
            | Value::Lambda(_)
            | Value::Accessor(_) => true,
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) | Value::Accessor(_) => "object",
            Value::Func(_) | Value::Lambda(_) => "function",
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            #[allow(clippy::cast_possible_truncation)]
            Value::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Own-property access: object keys, array indices, `length` of arrays
    /// and strings, and [`Lookup::property`] for accessors.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<Value> {
        match self {
            Value::Object(map) => map.get(name).cloned(),
            Value::Array(items) => match name {
                "length" => i64::try_from(items.len()).ok().map(Value::Int),
                _ => name.parse::<usize>().ok().and_then(|idx| items.get(idx).cloned()),
            },
            Value::String(s) if name == "length" => {
                i64::try_from(s.chars().count()).ok().map(Value::Int)
            }
            Value::Accessor(lookup) => lookup.property(name),
            _ => None,
        }
    }

    /// The string a template writes for this value.
    #[must_use]
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null | Value::Func(_) | Value::Lambda(_) => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(Value::to_display_string)
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => serde_json::to_string(self).unwrap_or_default(),
            Value::Accessor(lookup) => lookup
                .snapshot()
                .map(|value| value.to_display_string())
                .unwrap_or_default(),
        }
    }

    /// Convert to plain JSON. Callables become `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Integral floats print without a fraction, the way JavaScript does.
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        let sign = if f > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if f == 0.0 {
        // Covers -0.0 as well.
        "0".to_string()
    } else if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{f:.0}")
    } else {
        f.to_string()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Value::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Array(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Object(map) => f.debug_map().entries(map.iter()).finish(),
            Value::Func(_) => f.write_str("Func(..)"),
            Value::Lambda(_) => f.write_str("Lambda(..)"),
            Value::Accessor(lookup) => match lookup.snapshot() {
                Some(snapshot) => f.debug_tuple("Accessor").field(&snapshot).finish(),
                None => f.write_str("Accessor(..)"),
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            #[allow(clippy::float_cmp, clippy::cast_precision_loss)]
            (Value::Float(a), Value::Float(b)) => a == b,
            #[allow(clippy::float_cmp, clippy::cast_precision_loss)]
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Func(a), Value::Func(b)) => Rc::ptr_eq(&a.0, &b.0),
            (Value::Lambda(a), Value::Lambda(b)) => Rc::ptr_eq(&a.0, &b.0),
            (Value::Accessor(a), Value::Accessor(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null | Value::Func(_) | Value::Lambda(_) => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries.iter() {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Value::Accessor(lookup) => match lookup.snapshot() {
                Some(snapshot) => snapshot.serialize(serializer),
                None => serializer.serialize_unit(),
            },
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::array(items.into_iter().map(Value::from)),
            serde_json::Value::Object(map) => {
                Value::object(map.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(items))
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Object(Rc::new(map))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
