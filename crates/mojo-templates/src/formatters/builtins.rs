//! Built-in formatters available to every engine.
//!
//! String formatters leave `null` alone so a missing field still renders as
//! nothing; `default` is the way to substitute a value for it.

use super::Formatters;
use crate::value::format_float;
use crate::value::Value;

pub(super) fn register_all(formatters: &Formatters) {
    formatters.register("upper", |v, _| map_str(v, str::to_uppercase));
    formatters.register("uppercase", |v, _| map_str(v, str::to_uppercase));
    formatters.register("lower", |v, _| map_str(v, str::to_lowercase));
    formatters.register("lowercase", |v, _| map_str(v, str::to_lowercase));
    formatters.register("capitalize", |v, _| map_str(v, capitalize));
    formatters.register("title", |v, _| map_str(v, title));
    formatters.register("trim", |v, _| map_str(v, |s| s.trim().to_string()));
    formatters.register("slug", |v, _| map_str(v, slug));
    formatters.register("truncate", truncate);
    formatters.register("default", default);
    formatters.register("number", |v, args| {
        let decimals = arg_usize(args, 0, 0);
        numeric(v, |n| format_number(n, decimals))
    });
    formatters.register("currency", currency);
    formatters.register("percent", |v, args| {
        let decimals = arg_usize(args, 0, 0);
        numeric(v, |n| format!("{}%", format_number(n * 100.0, decimals)))
    });
    formatters.register("yesno", |v, args| {
        let word = if v.is_truthy() {
            arg_str(args, 0, "yes")
        } else {
            arg_str(args, 1, "no")
        };
        Value::String(word)
    });
    formatters.register("pluralize", |v, args| {
        let one = v.as_f64().is_some_and(|n| (n - 1.0).abs() < f64::EPSILON);
        Value::String(if one {
            arg_str(args, 0, "")
        } else {
            arg_str(args, 1, "s")
        })
    });
    formatters.register("length", |v, _| length(v));
    formatters.register("json", |v, _| {
        Value::String(serde_json::to_string(v).unwrap_or_default())
    });
    formatters.register("join", |v, args| match v {
        Value::Array(items) => {
            let separator = arg_str(args, 0, ",");
            Value::String(
                items
                    .iter()
                    .map(Value::to_display_string)
                    .collect::<Vec<_>>()
                    .join(&separator),
            )
        }
        other => other.clone(),
    });
    formatters.register("first", |v, _| match v {
        Value::Array(items) => items.first().cloned().unwrap_or_default(),
        Value::String(s) => s.chars().next().map(String::from).into(),
        other => other.clone(),
    });
    formatters.register("last", |v, _| match v {
        Value::Array(items) => items.last().cloned().unwrap_or_default(),
        Value::String(s) => s.chars().next_back().map(String::from).into(),
        other => other.clone(),
    });
}

fn map_str(value: &Value, f: impl Fn(&str) -> String) -> Value {
    match value {
        Value::Null => Value::Null,
        other => Value::String(f(&other.to_display_string())),
    }
}

fn numeric(value: &Value, f: impl Fn(f64) -> String) -> Value {
    match value.as_f64() {
        Some(n) if !matches!(value, Value::Bool(_)) => Value::String(f(n)),
        _ => value.clone(),
    }
}

fn arg_str(args: &[Value], idx: usize, fallback: &str) -> String {
    args.get(idx)
        .map_or_else(|| fallback.to_string(), Value::to_display_string)
}

fn arg_usize(args: &[Value], idx: usize, fallback: usize) -> usize {
    args.get(idx)
        .and_then(Value::as_i64)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(fallback)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn title(s: &str) -> String {
    s.split(' ')
        .map(|word| capitalize(&word.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            out.push(ch);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

fn truncate(value: &Value, args: &[Value]) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    let text = value.to_display_string();
    let limit = arg_usize(args, 0, 50);
    if text.chars().count() <= limit {
        return Value::String(text);
    }
    let suffix = arg_str(args, 1, "...");
    let mut out: String = text.chars().take(limit).collect();
    out.push_str(&suffix);
    Value::String(out)
}

fn default(value: &Value, args: &[Value]) -> Value {
    match value {
        Value::Null => args.first().cloned().unwrap_or_default(),
        Value::String(s) if s.is_empty() => args.first().cloned().unwrap_or_default(),
        other => other.clone(),
    }
}

fn currency(value: &Value, args: &[Value]) -> Value {
    let symbol = arg_str(args, 0, "$");
    let decimals = arg_usize(args, 1, 2);
    numeric(value, |n| {
        let formatted = format_number(n.abs(), decimals);
        if n < 0.0 {
            format!("-{symbol}{formatted}")
        } else {
            format!("{symbol}{formatted}")
        }
    })
}

fn length(value: &Value) -> Value {
    let len = match value {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        Value::String(s) => s.chars().count(),
        Value::Accessor(lookup) => return lookup.snapshot().map_or(Value::Int(0), |v| length(&v)),
        _ => 0,
    };
    i64::try_from(len).map_or(Value::Null, Value::Int)
}

/// Fixed decimals with `,` thousands separators.
fn format_number(n: f64, decimals: usize) -> String {
    if !n.is_finite() {
        return format_float(n);
    }
    let fixed = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(fixed.len() + fixed.len() / 3);
    for (idx, digit) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let negative = n < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    let sign = if negative { "-" } else { "" };
    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn apply(name: &str, value: impl Into<Value>, args: &[Value]) -> Value {
        Formatters::with_builtins().apply(name, &value.into(), args)
    }

    #[test]
    fn case_formatters() {
        assert_eq!(apply("upper", "Hello", &[]), Value::from("HELLO"));
        assert_eq!(apply("lowercase", "Hello", &[]), Value::from("hello"));
        assert_eq!(apply("capitalize", "hello world", &[]), Value::from("Hello world"));
        assert_eq!(apply("title", "hELLO wORLD", &[]), Value::from("Hello World"));
        assert_eq!(apply("upper", Value::Null, &[]), Value::Null);
    }

    #[test]
    fn truncate_adds_suffix_only_when_needed() {
        let args = [Value::Int(5)];
        assert_eq!(apply("truncate", "abcdefgh", &args), Value::from("abcde..."));
        assert_eq!(apply("truncate", "abc", &args), Value::from("abc"));
        let custom = [Value::Int(2), Value::from("…")];
        assert_eq!(apply("truncate", "héllo", &custom), Value::from("hé…"));
    }

    #[test]
    fn default_replaces_missing_and_empty() {
        let args = [Value::from("n/a")];
        assert_eq!(apply("default", Value::Null, &args), Value::from("n/a"));
        assert_eq!(apply("default", "", &args), Value::from("n/a"));
        assert_eq!(apply("default", Value::Int(0), &args), Value::Int(0));
        assert_eq!(apply("default", "set", &args), Value::from("set"));
    }

    #[test]
    fn number_formatting() {
        assert_eq!(apply("number", 1_234_567, &[]), Value::from("1,234,567"));
        assert_eq!(
            apply("number", 1234.5, &[Value::Int(2)]),
            Value::from("1,234.50")
        );
        assert_eq!(apply("number", -999.0, &[]), Value::from("-999"));
        assert_eq!(apply("number", "abc", &[]), Value::from("abc"));
    }

    #[test]
    fn currency_and_percent() {
        assert_eq!(apply("currency", 1234.5, &[]), Value::from("$1,234.50"));
        assert_eq!(
            apply("currency", -3, &[Value::from("€"), Value::Int(0)]),
            Value::from("-€3")
        );
        assert_eq!(apply("percent", 0.256, &[Value::Int(1)]), Value::from("25.6%"));
    }

    #[test]
    fn yesno_and_pluralize() {
        assert_eq!(apply("yesno", true, &[]), Value::from("yes"));
        assert_eq!(
            apply("yesno", 0, &[Value::from("on"), Value::from("off")]),
            Value::from("off")
        );
        assert_eq!(apply("pluralize", 1, &[]), Value::from(""));
        assert_eq!(apply("pluralize", 2, &[]), Value::from("s"));
        assert_eq!(
            apply("pluralize", 1, &[Value::from("child"), Value::from("children")]),
            Value::from("child")
        );
    }

    #[test]
    fn collection_formatters() {
        let items = Value::from(json!(["a", "b", "c"]));
        assert_eq!(apply("length", items.clone(), &[]), Value::Int(3));
        assert_eq!(
            apply("join", items.clone(), &[Value::from(" / ")]),
            Value::from("a / b / c")
        );
        assert_eq!(apply("first", items.clone(), &[]), Value::from("a"));
        assert_eq!(apply("last", items, &[]), Value::from("c"));
        assert_eq!(apply("length", "héllo", &[]), Value::Int(5));
    }

    #[test]
    fn json_and_slug() {
        assert_eq!(
            apply("json", Value::from(json!({"a": [1, true]})), &[]),
            Value::from(r#"{"a":[1,true]}"#)
        );
        assert_eq!(
            apply("slug", "  Hello, World! 2024 ", &[]),
            Value::from("hello-world-2024")
        );
    }
}
