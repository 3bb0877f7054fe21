use serde::Serialize;

use crate::span::Span;

/// The open/close delimiter pair used to recognise tags.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Tags {
    pub open: String,
    pub close: String,
}

impl Tags {
    pub const DEFAULT_OPEN: &'static str = "{{";
    pub const DEFAULT_CLOSE: &'static str = "}}";

    #[must_use]
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// Parse a delimiter pair written as two whitespace-separated words,
    /// e.g. `<% %>`, the way a `{{=<% %>=}}` tag spells it.
    #[must_use]
    pub fn parse(pair: &str) -> Option<Self> {
        let mut parts = pair.split_whitespace();
        let open = parts.next()?;
        let close = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(open, close))
    }
}

impl Default for Tags {
    fn default() -> Self {
        Self::new(Self::DEFAULT_OPEN, Self::DEFAULT_CLOSE)
    }
}

impl std::fmt::Display for Tags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.open, self.close)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    Text,
    Name,
    Unescaped,
    Section,
    InvertedSection,
    Close,
    Partial,
    Comment,
    SetDelimiters,
}

impl TokenKind {
    /// Classify a tag by the sigil that follows its open delimiter.
    #[must_use]
    pub fn from_sigil(sigil: &str) -> Self {
        match sigil {
            "#" => TokenKind::Section,
            "^" => TokenKind::InvertedSection,
            "/" => TokenKind::Close,
            ">" => TokenKind::Partial,
            "{" | "&" => TokenKind::Unescaped,
            "=" => TokenKind::SetDelimiters,
            "!" => TokenKind::Comment,
            _ => TokenKind::Name,
        }
    }

    #[must_use]
    pub fn opens_section(self) -> bool {
        matches!(self, TokenKind::Section | TokenKind::InvertedSection)
    }
}

/// A flat token as produced by the scanning pass, before nesting.
///
/// `value` is literal text for [`TokenKind::Text`] and the trimmed tag body
/// for everything else. `span` covers the whole tag, delimiters included.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, value: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            value: value.into(),
            span,
        }
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        self.kind == TokenKind::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delimiter_pair() {
        assert_eq!(Tags::parse("<% %>"), Some(Tags::new("<%", "%>")));
        assert_eq!(Tags::parse("  [[   ]]  "), Some(Tags::new("[[", "]]")));
        assert_eq!(Tags::parse("<%"), None);
        assert_eq!(Tags::parse("<% %> extra"), None);
        assert_eq!(Tags::parse(""), None);
    }

    #[test]
    fn sigil_classification() {
        assert_eq!(TokenKind::from_sigil(""), TokenKind::Name);
        assert_eq!(TokenKind::from_sigil("{"), TokenKind::Unescaped);
        assert_eq!(TokenKind::from_sigil("&"), TokenKind::Unescaped);
        assert_eq!(TokenKind::from_sigil("^"), TokenKind::InvertedSection);
        assert!(TokenKind::Section.opens_section());
        assert!(!TokenKind::Close.opens_section());
    }
}
