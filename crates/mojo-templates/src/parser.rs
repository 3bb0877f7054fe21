use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseError;
use crate::nodelist::Node;
use crate::nodelist::Template;
use crate::scanner::Scanner;
use crate::span::Span;
use crate::tokens::Tags;
use crate::tokens::Token;
use crate::tokens::TokenKind;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| anchored(r"\s*"));
static SIGIL: LazyLock<Regex> = LazyLock::new(|| anchored(r"[#^/>{&=!]"));
static EQUALS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*=").expect("valid regex"));
static EQUALS_ANCHORED: LazyLock<Regex> = LazyLock::new(|| anchored(r"\s*="));
static CURLY: LazyLock<Regex> = LazyLock::new(|| anchored(r"\s*\}"));

fn anchored(pattern: &str) -> Regex {
    Regex::new(&format!("^(?:{pattern})")).expect("valid regex")
}

/// Regexes derived from the active delimiter pair.
struct TagPatterns {
    open: Regex,
    open_anchored: Regex,
    close: Regex,
    close_anchored: Regex,
    close_curly: Regex,
}

impl TagPatterns {
    fn new(tags: &Tags) -> Result<Self, regex::Error> {
        let open = format!(r"{}\s*", regex::escape(&tags.open));
        let close = format!(r"\s*{}", regex::escape(&tags.close));
        let close_curly = format!(r"\s*{}", regex::escape(&format!("}}{}", tags.close)));

        Ok(Self {
            open_anchored: Regex::new(&format!("^(?:{open})"))?,
            open: Regex::new(&open)?,
            close_anchored: Regex::new(&format!("^(?:{close})"))?,
            close: Regex::new(&close)?,
            close_curly: Regex::new(&close_curly)?,
        })
    }
}

/// Turns template source into a nested [`Template`].
///
/// Scanning emits a flat token stream (one `Text` token per character of
/// literal text), which is then squashed and nested into a section tree.
pub struct Parser<'a> {
    source: &'a str,
    tags: Tags,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub fn new(source: &'a str, tags: Tags) -> Self {
        Self {
            source,
            tags,
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn parse(mut self) -> Template {
        let tokens = squash(self.tokenize());
        let nodes = self.nest(tokens);

        for error in &self.errors {
            tracing::debug!(code = error.diagnostic_code(), "{error}");
        }

        Template::new(self.source.to_string(), self.tags, nodes, self.errors)
    }

    /// Scan the source into a flat token stream.
    ///
    /// Delimiter changes take effect for the remainder of the scan; the
    /// parser's starting tags are left untouched.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::with_capacity(self.source.len() / 4);
        let mut scanner = Scanner::new(self.source);

        let mut patterns = match TagPatterns::new(&self.tags) {
            Ok(patterns) => patterns,
            Err(_) => {
                self.errors.push(ParseError::InvalidDelimiters {
                    content: self.tags.to_string(),
                    span: Span::default(),
                });
                push_text(&mut tokens, self.source, 0);
                return tokens;
            }
        };

        let mut active = self.tags.clone();

        while !scanner.is_at_end() {
            let text_start = scanner.pos();
            let text = scanner.scan_until(&patterns.open);
            push_text(&mut tokens, text, text_start);

            let tag_start = scanner.pos();
            if scanner.scan(&patterns.open_anchored).is_empty() {
                break;
            }

            let sigil = scanner.scan(&SIGIL);
            let kind = TokenKind::from_sigil(sigil);
            scanner.scan(&WHITESPACE);

            let value = match kind {
                TokenKind::SetDelimiters => {
                    let value = scanner.scan_until(&EQUALS);
                    scanner.scan(&EQUALS_ANCHORED);
                    scanner.scan_until(&patterns.close);
                    value
                }
                TokenKind::Unescaped if sigil == "{" => {
                    let value = scanner.scan_until(&patterns.close_curly);
                    scanner.scan(&CURLY);
                    scanner.scan_until(&patterns.close);
                    value
                }
                _ => scanner.scan_until(&patterns.close),
            };

            if scanner.scan(&patterns.close_anchored).is_empty() {
                let span = Span::from_bounds(tag_start, scanner.pos());
                let close = match sigil {
                    "=" => format!("={}", active.close),
                    "{" => format!("}}{}", active.close),
                    _ => active.close.clone(),
                };
                self.errors.push(ParseError::UnclosedTag { close, span });
                push_text(&mut tokens, &self.source[tag_start..], tag_start);
                break;
            }

            let span = Span::from_bounds(tag_start, scanner.pos());
            let value = value.trim();

            match kind {
                TokenKind::SetDelimiters => {
                    match Tags::parse(value).map(|tags| (TagPatterns::new(&tags), tags)) {
                        Some((Ok(next), tags)) => {
                            patterns = next;
                            tokens.push(Token::new(kind, tags.to_string(), span));
                            active = tags;
                        }
                        _ => self.errors.push(ParseError::InvalidDelimiters {
                            content: value.to_string(),
                            span,
                        }),
                    }
                }
                TokenKind::Comment => tokens.push(Token::new(kind, value, span)),
                _ if value.is_empty() => self.errors.push(ParseError::EmptyTag { span }),
                _ => tokens.push(Token::new(kind, value, span)),
            }
        }

        tokens
    }

    /// Nest a squashed token stream into a section tree.
    ///
    /// A close tag closes the innermost open section with the same name,
    /// implicitly closing anything opened inside it. A close tag that
    /// matches no open section is dropped.
    fn nest(&mut self, tokens: Vec<Token>) -> Vec<Node> {
        let mut root = Vec::new();
        let mut stack: Vec<OpenSection> = Vec::new();

        for token in tokens {
            match token.kind {
                TokenKind::Section | TokenKind::InvertedSection => {
                    stack.push(OpenSection {
                        name: token.value,
                        inverted: token.kind == TokenKind::InvertedSection,
                        span: token.span,
                        children: Vec::new(),
                    });
                }
                TokenKind::Close => {
                    let Some(idx) = stack.iter().rposition(|open| open.name == token.value) else {
                        self.errors.push(ParseError::UnmatchedClose {
                            name: token.value,
                            span: token.span,
                        });
                        continue;
                    };

                    let body_end = token.span.start_usize();
                    while stack.len() > idx {
                        let Some(open) = stack.pop() else { break };
                        if stack.len() > idx {
                            self.errors.push(ParseError::UnclosedSection {
                                name: open.name.clone(),
                                span: open.span,
                            });
                        }
                        let node = open.finish(body_end);
                        insert(&mut stack, &mut root, node);
                    }
                }
                TokenKind::SetDelimiters => {}
                TokenKind::Text => insert(
                    &mut stack,
                    &mut root,
                    Node::Text {
                        text: token.value,
                        span: token.span,
                    },
                ),
                TokenKind::Name | TokenKind::Unescaped => insert(
                    &mut stack,
                    &mut root,
                    Node::Variable {
                        name: token.value,
                        escaped: token.kind == TokenKind::Name,
                        span: token.span,
                    },
                ),
                TokenKind::Partial => insert(
                    &mut stack,
                    &mut root,
                    Node::Partial {
                        name: token.value,
                        span: token.span,
                    },
                ),
                TokenKind::Comment => insert(
                    &mut stack,
                    &mut root,
                    Node::Comment {
                        content: token.value,
                        span: token.span,
                    },
                ),
            }
        }

        while let Some(open) = stack.pop() {
            self.errors.push(ParseError::UnclosedSection {
                name: open.name.clone(),
                span: open.span,
            });
            let node = open.finish(self.source.len());
            insert(&mut stack, &mut root, node);
        }

        root
    }
}

struct OpenSection {
    name: String,
    inverted: bool,
    span: Span,
    children: Vec<Node>,
}

impl OpenSection {
    fn finish(self, body_end: usize) -> Node {
        Node::Section {
            body: Span::from_bounds(self.span.end_usize(), body_end),
            name: self.name,
            inverted: self.inverted,
            span: self.span,
            children: self.children,
        }
    }
}

fn insert(stack: &mut [OpenSection], root: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(open) => open.children.push(node),
        None => root.push(node),
    }
}

fn push_text(tokens: &mut Vec<Token>, text: &str, start: usize) {
    for (offset, ch) in text.char_indices() {
        let at = start + offset;
        tokens.push(Token::new(
            TokenKind::Text,
            ch,
            Span::from_bounds(at, at + ch.len_utf8()),
        ));
    }
}

/// Coalesce runs of adjacent text tokens into single tokens.
fn squash(tokens: Vec<Token>) -> Vec<Token> {
    let mut squashed: Vec<Token> = Vec::with_capacity(tokens.len());

    for token in tokens {
        match squashed.last_mut() {
            Some(last) if last.is_text() && token.is_text() => {
                last.value.push_str(&token.value);
                last.span = Span::new(last.span.start, token.span.end() - last.span.start);
            }
            _ => squashed.push(token),
        }
    }

    squashed
}
