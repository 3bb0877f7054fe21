use annotate_snippets::AnnotationKind;
use annotate_snippets::Level;
use annotate_snippets::Renderer;
use annotate_snippets::Snippet;
use mojo_conf::DiagnosticSeverity;
use mojo_templates::ParseError;
use mojo_templates::Span;

/// Level a rendered diagnostic is printed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    /// `None` for diagnostics configured off.
    #[must_use]
    pub fn from_config(severity: DiagnosticSeverity) -> Option<Self> {
        match severity {
            DiagnosticSeverity::Off => None,
            DiagnosticSeverity::Error => Some(Severity::Error),
            DiagnosticSeverity::Warning => Some(Severity::Warning),
            DiagnosticSeverity::Info => Some(Severity::Info),
            DiagnosticSeverity::Hint => Some(Severity::Hint),
        }
    }
}

/// One problem in one template file, ready to print.
#[derive(Debug)]
pub struct Diagnostic<'a> {
    pub source: &'a str,
    pub path: &'a str,
    pub code: &'a str,
    pub message: String,
    pub severity: Severity,
    pub span: Span,
    pub label: &'static str,
    pub notes: Vec<&'static str>,
}

impl<'a> Diagnostic<'a> {
    /// Describe a parse error found in `source`.
    #[must_use]
    pub fn from_parse_error(
        source: &'a str,
        path: &'a str,
        error: &ParseError,
        severity: Severity,
    ) -> Self {
        let (label, notes): (&'static str, Vec<&'static str>) = match error {
            ParseError::UnclosedTag { .. } => (
                "tag opened here is never closed",
                vec!["the rest of the template renders as literal text"],
            ),
            ParseError::UnclosedSection { .. } => (
                "section opened here",
                vec!["the section runs to the end of the template"],
            ),
            ParseError::UnmatchedClose { .. } => ("no open section has this name", vec![]),
            ParseError::InvalidDelimiters { .. } => (
                "expected two delimiters separated by whitespace",
                vec!["the current delimiters stay in effect"],
            ),
            ParseError::EmptyTag { .. } => ("this tag has no name", vec![]),
        };

        Self {
            source,
            path,
            code: error.diagnostic_code(),
            message: error.to_string(),
            severity,
            span: error.span(),
            label,
            notes,
        }
    }
}

/// Renders diagnostics with `annotate-snippets`, plain or with ANSI styling.
#[derive(Debug)]
pub struct DiagnosticRenderer {
    renderer: Renderer,
}

impl DiagnosticRenderer {
    #[must_use]
    pub fn plain() -> Self {
        Self {
            renderer: Renderer::plain(),
        }
    }

    #[must_use]
    pub fn styled() -> Self {
        Self {
            renderer: Renderer::styled(),
        }
    }

    #[must_use]
    pub fn render(&self, diagnostic: &Diagnostic<'_>) -> String {
        let level = match diagnostic.severity {
            Severity::Error => Level::ERROR,
            Severity::Warning => Level::WARNING,
            Severity::Info => Level::INFO,
            Severity::Hint => Level::HELP,
        };

        // Clamp so a span at end of input still points at something.
        let len = diagnostic.source.len();
        let start = diagnostic.span.start_usize().min(len);
        let end = diagnostic.span.end_usize().clamp(start, len);

        let snippet = Snippet::source(diagnostic.source)
            .path(diagnostic.path)
            .line_start(1)
            .annotation(
                AnnotationKind::Primary
                    .span(start..end)
                    .label(diagnostic.label),
            );

        let mut title = level
            .primary_title(diagnostic.message.as_str())
            .id(diagnostic.code)
            .element(snippet);

        for note in &diagnostic.notes {
            title = title.element(Level::NOTE.message(*note));
        }

        self.renderer.render(&[title]).clone()
    }
}

#[cfg(test)]
mod tests {
    use mojo_templates::Parser;
    use mojo_templates::Tags;

    use super::*;

    fn first_error(source: &str) -> ParseError {
        Parser::new(source, Tags::default())
            .parse()
            .errors()
            .first()
            .cloned()
            .expect("a parse error")
    }

    fn render(source: &str, severity: Severity) -> String {
        let error = first_error(source);
        let diag = Diagnostic::from_parse_error(source, "views/page.mustache", &error, severity);
        DiagnosticRenderer::plain().render(&diag)
    }

    #[test]
    fn unclosed_section() {
        let output = render("<ul>\n{{#items}}\n<li>{{name}}</li>\n", Severity::Error);
        assert!(output.contains("error[T101]"), "{output}");
        assert!(output.contains("views/page.mustache"), "{output}");
        assert!(output.contains("{{#items}}"), "{output}");
        assert!(output.contains("section opened here"), "{output}");
        assert!(output.contains("note: the section runs to the end"), "{output}");
        assert!(output.contains("^^^"), "{output}");
    }

    #[test]
    fn unmatched_close_as_warning() {
        let output = render("a{{/nothing}}b", Severity::Warning);
        assert!(output.contains("warning[T102]"), "{output}");
        assert!(output.contains("no open section has this name"), "{output}");
    }

    #[test]
    fn span_at_end_of_input() {
        let output = render("text {{unterminated", Severity::Error);
        assert!(output.contains("error[T100]"), "{output}");
    }

    #[test]
    fn severity_from_config() {
        assert_eq!(Severity::from_config(DiagnosticSeverity::Off), None);
        assert_eq!(
            Severity::from_config(DiagnosticSeverity::Hint),
            Some(Severity::Hint)
        );
    }

    #[test]
    fn styled_produces_ansi() {
        let source = "{{#open}}";
        let error = first_error(source);
        let diag = Diagnostic::from_parse_error(source, "t.mustache", &error, Severity::Error);
        let styled = DiagnosticRenderer::styled().render(&diag);
        let plain = DiagnosticRenderer::plain().render(&diag);
        assert!(styled.contains("\x1b["));
        assert!(!plain.contains("\x1b["));
    }
}
