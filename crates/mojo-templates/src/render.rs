use rustc_hash::FxHashMap;

use crate::cache::TemplateCache;
use crate::context::Context;
use crate::escape::escape_html;
use crate::nodelist::Node;
use crate::nodelist::Template;
use crate::tokens::Tags;
use crate::value::Value;

/// How deep `{{> partial}}` tags may nest before rendering stops.
pub const MAX_PARTIAL_DEPTH: usize = 64;

/// Where `{{> name}}` tags find their templates.
#[derive(Clone, Copy, Default)]
pub enum Partials<'a> {
    #[default]
    None,
    Map(&'a FxHashMap<String, String>),
    Resolver(&'a dyn Fn(&str) -> Option<String>),
}

impl Partials<'_> {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        match self {
            Partials::None => None,
            Partials::Map(map) => map.get(name).cloned(),
            Partials::Resolver(resolve) => resolve(name),
        }
    }
}

impl<'a> From<&'a FxHashMap<String, String>> for Partials<'a> {
    fn from(map: &'a FxHashMap<String, String>) -> Self {
        Partials::Map(map)
    }
}

impl std::fmt::Debug for Partials<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Partials::None => f.write_str("None"),
            Partials::Map(map) => f.debug_tuple("Map").field(&map.len()).finish(),
            Partials::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

/// Walks a parsed template against a context chain.
///
/// Partials and strings rendered on behalf of section lambdas are parsed
/// through the shared cache with this renderer's tags.
pub struct Renderer<'r> {
    cache: &'r TemplateCache,
    partials: Partials<'r>,
    tags: Tags,
}

impl<'r> Renderer<'r> {
    #[must_use]
    pub fn new(cache: &'r TemplateCache, partials: Partials<'r>, tags: Tags) -> Self {
        Self {
            cache,
            partials,
            tags,
        }
    }

    #[must_use]
    pub fn render(&self, template: &Template, ctx: &Context<'_>) -> String {
        let mut out = String::with_capacity(template.source().len());
        self.render_nodes(template.nodes(), template.source(), ctx, 0, &mut out);
        out
    }

    /// Parse `source` with this renderer's tags and render it in `ctx`.
    fn render_source(&self, source: &str, ctx: &Context<'_>, depth: usize) -> String {
        let template = self.cache.get_or_parse(source, &self.tags);
        let mut out = String::with_capacity(source.len());
        self.render_nodes(template.nodes(), template.source(), ctx, depth, &mut out);
        out
    }

    fn render_nodes(
        &self,
        nodes: &[Node],
        source: &str,
        ctx: &Context<'_>,
        depth: usize,
        out: &mut String,
    ) {
        for node in nodes {
            self.render_node(node, source, ctx, depth, out);
        }
    }

    fn render_node(
        &self,
        node: &Node,
        source: &str,
        ctx: &Context<'_>,
        depth: usize,
        out: &mut String,
    ) {
        match node {
            Node::Text { text, .. } => out.push_str(text),
            Node::Comment { .. } => {}
            Node::Variable { name, escaped, .. } => match ctx.lookup(name) {
                Value::Null | Value::Lambda(_) => {}
                value => {
                    let text = value.to_display_string();
                    if *escaped {
                        out.push_str(&escape_html(&text));
                    } else {
                        out.push_str(&text);
                    }
                }
            },
            Node::Section {
                name,
                inverted: true,
                children,
                ..
            } => {
                if is_blank(&ctx.lookup(name)) {
                    self.render_nodes(children, source, ctx, depth, out);
                }
            }
            Node::Section {
                name,
                inverted: false,
                body,
                children,
                ..
            } => match ctx.lookup(name) {
                Value::Lambda(lambda) => {
                    let render = |text: &str| self.render_source(text, ctx, depth);
                    let result = lambda.call(body.slice(source), &render);
                    if !result.is_null() {
                        out.push_str(&result.to_display_string());
                    }
                }
                Value::Array(items) => {
                    for item in items.iter() {
                        let frame = ctx.push(item.clone());
                        self.render_nodes(children, source, &frame, depth, out);
                    }
                }
                value if value.is_truthy() => {
                    let frame = ctx.push(value);
                    self.render_nodes(children, source, &frame, depth, out);
                }
                _ => {}
            },
            Node::Partial { name, .. } => self.render_partial(name, ctx, depth, out),
        }
    }

    fn render_partial(&self, name: &str, ctx: &Context<'_>, depth: usize, out: &mut String) {
        if depth >= MAX_PARTIAL_DEPTH {
            tracing::warn!(
                partial = name,
                max_depth = MAX_PARTIAL_DEPTH,
                "partial nesting too deep, skipping"
            );
            return;
        }

        let Some(source) = self.partials.get(name) else {
            tracing::debug!(partial = name, "partial not found");
            return;
        };

        let template = self.cache.get_or_parse(&source, &self.tags);
        self.render_nodes(template.nodes(), template.source(), ctx, depth + 1, out);
    }
}

/// Missing, falsy, or an empty array.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.is_empty(),
        other => !other.is_truthy(),
    }
}
