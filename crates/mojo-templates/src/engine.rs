use std::sync::Arc;
use std::sync::LazyLock;

use crate::cache::TemplateCache;
use crate::context::Context;
use crate::error::TemplateError;
use crate::formatters::Formatters;
use crate::nodelist::Template;
use crate::render::Partials;
use crate::render::Renderer;
use crate::tokens::Tags;
use crate::value::Value;
use crate::wrap;
use crate::wrap::DEFAULT_WRAP_DEPTH;

static GLOBAL: LazyLock<Engine> = LazyLock::new(Engine::new);

/// Per-call rendering options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderConfig {
    /// Delimiters to start parsing with. `None` means `{{ }}`.
    pub tags: Option<Tags>,
}

impl RenderConfig {
    #[must_use]
    pub fn with_tags(tags: Tags) -> Self {
        Self { tags: Some(tags) }
    }
}

/// A template engine: a parse cache plus a formatter registry.
///
/// Engines are independent of each other. [`Engine::global`] is a shared
/// default instance used by the crate-level free functions.
#[derive(Debug)]
pub struct Engine {
    cache: TemplateCache,
    formatters: Arc<Formatters>,
    wrap_depth: usize,
}

impl Engine {
    /// An engine with an empty cache and the built-in formatters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_formatters(Formatters::with_builtins())
    }

    #[must_use]
    pub fn with_formatters(formatters: Formatters) -> Self {
        Self {
            cache: TemplateCache::new(),
            formatters: Arc::new(formatters),
            wrap_depth: DEFAULT_WRAP_DEPTH,
        }
    }

    /// Change how many levels [`Engine::wrap`] wraps.
    #[must_use]
    pub fn wrap_depth(mut self, depth: usize) -> Self {
        self.wrap_depth = depth;
        self
    }

    #[must_use]
    pub fn global() -> &'static Engine {
        &GLOBAL
    }

    pub fn render(&self, template: &str, data: &Value, partials: Partials<'_>) -> String {
        self.render_with(template, data, partials, &RenderConfig::default())
    }

    pub fn render_with(
        &self,
        template: &str,
        data: &Value,
        partials: Partials<'_>,
        config: &RenderConfig,
    ) -> String {
        let tags = config.tags.clone().unwrap_or_default();
        let parsed = self.cache.get_or_parse(template, &tags);
        let ctx = Context::new(data.clone(), &self.formatters);
        Renderer::new(&self.cache, partials, tags).render(&parsed, &ctx)
    }

    /// Render a template that arrives as a dynamic value.
    ///
    /// Anything other than a string is rejected before parsing.
    pub fn render_value(
        &self,
        template: &Value,
        data: &Value,
        partials: Partials<'_>,
        config: &RenderConfig,
    ) -> Result<String, TemplateError> {
        let Value::String(source) = template else {
            return Err(TemplateError::InvalidTemplate {
                found: template.type_name(),
            });
        };
        Ok(self.render_with(source, data, partials, config))
    }

    /// Parse (or fetch from cache) without rendering.
    pub fn parse(&self, template: &str, tags: Option<&Tags>) -> Arc<Template> {
        match tags {
            Some(tags) => self.cache.get_or_parse(template, tags),
            None => self.cache.get_or_parse(template, &Tags::default()),
        }
    }

    pub fn clear_cache(&self) {
        tracing::debug!(entries = self.cache.len(), "clearing template cache");
        self.cache.clear();
    }

    #[must_use]
    pub fn cached_templates(&self) -> usize {
        self.cache.len()
    }

    pub fn register_formatter<F>(&self, name: impl Into<String>, formatter: F)
    where
        F: Fn(&Value, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.formatters.register(name, formatter);
    }

    #[must_use]
    pub fn formatters(&self) -> &Formatters {
        &self.formatters
    }

    /// Wrap plain data into lookup-capable nodes using this engine's
    /// formatters and configured depth.
    #[must_use]
    pub fn wrap(&self, value: &Value) -> Value {
        self.wrap_with_depth(value, self.wrap_depth)
    }

    #[must_use]
    pub fn wrap_with_depth(&self, value: &Value, depth: usize) -> Value {
        wrap::wrap(value, depth, &self.formatters)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
