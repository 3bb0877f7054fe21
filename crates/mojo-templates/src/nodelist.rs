use serde::Serialize;

use crate::error::ParseError;
use crate::span::Span;
use crate::tokens::Tags;

/// A parsed template: the node tree plus what is needed to render it.
///
/// Instances are immutable once built and shared through the parse cache.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Template {
    source: String,
    tags: Tags,
    nodes: Vec<Node>,
    errors: Vec<ParseError>,
}

impl Template {
    #[must_use]
    pub fn new(source: String, tags: Tags, nodes: Vec<Node>, errors: Vec<ParseError>) -> Self {
        Self {
            source,
            tags,
            nodes,
            errors,
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The delimiters the template started with (before any `{{= =}}` tag).
    #[must_use]
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Node {
    Text {
        text: String,
        span: Span,
    },
    Variable {
        name: String,
        escaped: bool,
        span: Span,
    },
    Section {
        name: String,
        inverted: bool,
        span: Span,
        /// Source range between the opening tag and its close tag.
        body: Span,
        children: Vec<Node>,
    },
    Partial {
        name: String,
        span: Span,
    },
    Comment {
        content: String,
        span: Span,
    },
}

impl Node {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Node::Text { span, .. }
            | Node::Variable { span, .. }
            | Node::Section { span, .. }
            | Node::Partial { span, .. }
            | Node::Comment { span, .. } => *span,
        }
    }
}
