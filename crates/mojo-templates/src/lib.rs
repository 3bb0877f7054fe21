//! Logic-less `{{mustache}}`-style templates with format pipelines.
//!
//! ## Architecture
//!
//! Rendering is a short pipeline:
//!
//! 1. **Scanning**: the [`Parser`] walks the source once with a [`scanner::Scanner`],
//!    classifying each tag by its sigil into a flat token stream
//! 2. **Nesting**: adjacent text is squashed and section tags are nested into
//!    a [`Template`] tree, with recoverable problems collected as [`ParseError`]s
//! 3. **Caching**: parsed templates are cached per [`Engine`], keyed by source
//!    and delimiters
//! 4. **Rendering**: the [`Renderer`] walks the tree against a [`Context`]
//!    chain, resolving names and running `name|formatter(args)` pipelines
//!
//! ## Key Components
//!
//! - [`value`]: the data model templates render against
//! - [`context`]: name resolution through the frame chain
//! - [`formatters`]: named value transformations used by pipelines
//! - [`wrap`]: turning plain data into self-resolving nodes
//!
//! ## Example
//!
//! ```
//! use mojo_templates::{Engine, Partials, Value};
//! use serde_json::json;
//!
//! let engine = Engine::new();
//! let data = Value::from(json!({"items": [{"name": "a"}, {"name": "b"}]}));
//! let out = engine.render("{{#items}}{{name|upper}}{{/items}}", &data, Partials::None);
//! assert_eq!(out, "AB");
//! ```

mod cache;
pub mod context;
mod engine;
mod error;
mod escape;
pub mod formatters;
pub mod nodelist;
mod parser;
pub mod pipeline;
mod quotes;
mod render;
pub mod scanner;
mod span;
pub mod tokens;
pub mod value;
pub mod wrap;

use std::sync::Arc;

pub use cache::TemplateCache;
pub use context::Context;
pub use engine::Engine;
pub use engine::RenderConfig;
pub use error::ParseError;
pub use error::TemplateError;
pub use escape::escape_html;
pub use escape::unescape_html;
pub use formatters::Formatters;
pub use nodelist::Node;
pub use nodelist::Template;
pub use parser::Parser;
pub use render::Partials;
pub use render::Renderer;
pub use render::MAX_PARTIAL_DEPTH;
pub use span::Span;
pub use tokens::Tags;
pub use value::Lookup;
pub use value::LookupError;
pub use value::Value;

/// Render with the process-wide default [`Engine`].
pub fn render(template: &str, data: &Value, partials: Partials<'_>) -> String {
    Engine::global().render(template, data, partials)
}

/// Parse with the process-wide default [`Engine`].
pub fn parse(template: &str, tags: Option<&Tags>) -> Arc<Template> {
    Engine::global().parse(template, tags)
}

/// Empty the default engine's parse cache.
pub fn clear_cache() {
    Engine::global().clear_cache();
}

pub fn register_formatter<F>(name: impl Into<String>, formatter: F)
where
    F: Fn(&Value, &[Value]) -> Value + Send + Sync + 'static,
{
    Engine::global().register_formatter(name, formatter);
}

/// Wrap `value` with the default engine's formatters and depth.
#[must_use]
pub fn wrap(value: &Value) -> Value {
    Engine::global().wrap(value)
}
