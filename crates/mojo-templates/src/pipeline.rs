//! Parsing of `field|formatter(args)|...` lookup keys.
//!
//! The same [`parse`] serves template lookups and accessor `get` calls, so a
//! key string splits identically wherever it is evaluated.

use serde::Serialize;

use crate::formatters::Formatters;
use crate::quotes::for_each_top_level;
use crate::quotes::split_top_level;
use crate::quotes::unquote;
use crate::value::Value;

/// A lookup key split into the field to resolve and the formatters to run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FormatExpr {
    pub field: String,
    pub steps: Vec<FormatStep>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FormatStep {
    pub name: String,
    pub args: Vec<Value>,
}

impl FormatExpr {
    #[must_use]
    pub fn has_steps(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Feed `value` through every step in order.
    #[must_use]
    pub fn apply(&self, value: Value, formatters: &Formatters) -> Value {
        self.steps
            .iter()
            .fold(value, |value, step| formatters.apply(&step.name, &value, &step.args))
    }
}

/// Split a key on its top-level `|` characters.
///
/// Pipes inside parentheses or quotes do not split. Empty steps are skipped.
#[must_use]
pub fn parse(key: &str) -> FormatExpr {
    let mut pieces = split_top_level(key, '|').into_iter();
    let field = pieces.next().unwrap_or_default().trim().to_string();
    let steps = pieces.filter_map(parse_step).collect();
    FormatExpr { field, steps }
}

/// Whether `key` contains a top-level pipe at all.
#[must_use]
pub fn has_pipeline(key: &str) -> bool {
    let mut found = false;
    for_each_top_level(
        key,
        |ch| ch == '|',
        |_| {
            found = true;
            true
        },
    );
    found
}

fn parse_step(raw: &str) -> Option<FormatStep> {
    let raw = raw.trim();
    let (name, args) = match raw.find('(') {
        Some(open) => (&raw[..open], parse_args(&raw[open + 1..])),
        None => (raw, Vec::new()),
    };

    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    Some(FormatStep {
        name: name.to_string(),
        args,
    })
}

/// Parse the text after a step's opening paren.
///
/// Anything after the matching close paren is ignored; a missing close paren
/// takes the rest of the string as the argument list.
fn parse_args(after_open: &str) -> Vec<Value> {
    let inner = &after_open[..closing_paren(after_open).unwrap_or(after_open.len())];

    split_top_level(inner, ',')
        .into_iter()
        .map(str::trim)
        .filter(|arg| !arg.is_empty())
        .map(parse_literal)
        .collect()
}

/// Byte index of the `)` that closes an argument list opened just before
/// `s`, honouring nested parens and quotes.
fn closing_paren(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escape = false;
    let mut depth = 0usize;

    for (idx, ch) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match ch {
            '\\' if quote.is_some() => escape = true,
            '"' | '\'' if quote == Some(ch) => quote = None,
            '"' | '\'' if quote.is_none() => quote = Some(ch),
            _ if quote.is_some() => {}
            '(' => depth += 1,
            ')' if depth == 0 => return Some(idx),
            ')' => depth -= 1,
            _ => {}
        }
    }

    None
}

/// Interpret a single argument literal.
#[must_use]
pub fn parse_literal(raw: &str) -> Value {
    if let Some(text) = unquote(raw) {
        return Value::String(text);
    }

    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" | "undefined" => return Value::Null,
        _ => {}
    }

    if raw.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.')) {
        if let Ok(int) = raw.parse::<i64>() {
            return Value::Int(int);
        }
        if let Ok(float) = raw.parse::<f64>() {
            return Value::Float(float);
        }
    }

    Value::String(raw.to_string())
}
