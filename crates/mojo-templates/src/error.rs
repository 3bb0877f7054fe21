use serde::Serialize;
use thiserror::Error;

use crate::span::Span;

/// Hard failures surfaced to the caller of the engine.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
pub enum TemplateError {
    /// A template was supplied as a non-string value.
    ///
    /// This is the only error `render` raises; every data-shape mismatch
    /// during rendering degrades to empty output instead.
    #[error("Invalid template! Template should be a \"string\" but \"{found}\" was given")]
    InvalidTemplate { found: &'static str },
}

/// Recoverable problems found while parsing a template.
///
/// Parsing never fails outright. These are recorded on the parsed
/// [`Template`](crate::Template) so tooling can report them, while rendering
/// carries on with whatever structure could be recovered.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
pub enum ParseError {
    /// Open delimiter with no matching close delimiter.
    ///
    /// Everything from the open delimiter onwards is kept as literal text.
    #[error("Unclosed tag: expected '{close}'")]
    UnclosedTag { close: String, span: Span },

    /// A `#` or `^` section that is never closed.
    ///
    /// The section body runs to the end of the template.
    #[error("Unclosed section '{name}'")]
    UnclosedSection { name: String, span: Span },

    /// A close tag that names no open section. It is dropped.
    #[error("Close tag '{name}' does not match any open section")]
    UnmatchedClose { name: String, span: Span },

    /// A set-delimiter tag whose body is not exactly two delimiters.
    #[error("Invalid delimiters '{content}'")]
    InvalidDelimiters { content: String, span: Span },

    /// A tag that needs a name but has an empty body.
    #[error("Empty tag")]
    EmptyTag { span: Span },
}

impl ParseError {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnclosedTag { span, .. }
            | ParseError::UnclosedSection { span, .. }
            | ParseError::UnmatchedClose { span, .. }
            | ParseError::InvalidDelimiters { span, .. }
            | ParseError::EmptyTag { span } => *span,
        }
    }

    #[must_use]
    pub fn diagnostic_code(&self) -> &'static str {
        match self {
            ParseError::UnclosedTag { .. } => "T100",
            ParseError::UnclosedSection { .. } => "T101",
            ParseError::UnmatchedClose { .. } => "T102",
            ParseError::InvalidDelimiters { .. } => "T103",
            ParseError::EmptyTag { .. } => "T104",
        }
    }
}
