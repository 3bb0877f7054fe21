//! In-memory cache of parsed templates.
//!
//! Entries are keyed by the template source together with the delimiters it
//! is parsed with, since the same text tokenizes differently under other
//! tags. Entries are never evicted on their own; only [`TemplateCache::clear`]
//! drops them.

use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

use crate::nodelist::Template;
use crate::parser::Parser;
use crate::tokens::Tags;

#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: DashMap<(String, Tags), Arc<Template>, FxBuildHasher>,
}

impl TemplateCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached parse of `source` under `tags`, parsing on a miss.
    pub fn get_or_parse(&self, source: &str, tags: &Tags) -> Arc<Template> {
        let key = (source.to_string(), tags.clone());
        if let Some(entry) = self.entries.get(&key) {
            tracing::trace!(tags = %tags, "template cache hit");
            return Arc::clone(entry.value());
        }

        tracing::debug!(tags = %tags, len = source.len(), "template cache miss, parsing");
        let template = Arc::new(Parser::new(source, tags.clone()).parse());
        // Two threads racing on the same key parse identical trees; keep the
        // first one stored so every caller shares a single Arc.
        Arc::clone(self.entries.entry(key).or_insert(template).value())
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
