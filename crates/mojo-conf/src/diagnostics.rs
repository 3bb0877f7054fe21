use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

/// How a template diagnostic is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Off,
    Error,
    Warning,
    Info,
    Hint,
}

impl DiagnosticSeverity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticSeverity::Off => "off",
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
            DiagnosticSeverity::Info => "info",
            DiagnosticSeverity::Hint => "hint",
        }
    }

    /// Whether a diagnostic at this level should fail a `check` run.
    #[must_use]
    pub fn is_failure(self) -> bool {
        self == DiagnosticSeverity::Error
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity overrides for parse diagnostics.
///
/// Every code reports at "error" unless configured otherwise. Keys are either
/// a full code or a prefix; the most specific key wins.
///
/// ```toml
/// [diagnostics.severity]
/// "T" = "warning"   # every template diagnostic
/// T104 = "off"      # except empty tags, which are silenced
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct DiagnosticsConfig {
    #[serde(default)]
    pub severity: HashMap<String, DiagnosticSeverity>,
}

impl DiagnosticsConfig {
    /// Severity for `code`: exact key, else longest matching prefix, else
    /// error.
    ///
    /// ```
    /// # use mojo_conf::diagnostics::{DiagnosticsConfig, DiagnosticSeverity};
    /// let config = DiagnosticsConfig::default()
    ///     .with_severity("T", DiagnosticSeverity::Warning)
    ///     .with_severity("T10", DiagnosticSeverity::Off)
    ///     .with_severity("T100", DiagnosticSeverity::Error);
    ///
    /// assert_eq!(config.get_severity("T100"), DiagnosticSeverity::Error);
    /// assert_eq!(config.get_severity("T101"), DiagnosticSeverity::Off);
    /// assert_eq!(config.get_severity("T200"), DiagnosticSeverity::Warning);
    /// assert_eq!(config.get_severity("X1"), DiagnosticSeverity::Error);
    /// ```
    #[must_use]
    pub fn get_severity(&self, code: &str) -> DiagnosticSeverity {
        if let Some(&severity) = self.severity.get(code) {
            return severity;
        }

        // Layered config sources may hand keys back lowercased.
        let code = code.to_ascii_uppercase();
        let mut best: Option<(usize, DiagnosticSeverity)> = None;
        for (pattern, &severity) in &self.severity {
            let pattern = pattern.to_ascii_uppercase();
            if pattern == code {
                return severity;
            }
            if code.starts_with(&pattern) && best.map_or(true, |(len, _)| pattern.len() > len) {
                best = Some((pattern.len(), severity));
            }
        }

        best.map_or(DiagnosticSeverity::Error, |(_, severity)| severity)
    }

    #[must_use]
    pub fn is_enabled(&self, code: &str) -> bool {
        self.get_severity(code) != DiagnosticSeverity::Off
    }

    /// Set (or replace) the severity for a code or prefix.
    #[must_use]
    pub fn with_severity(mut self, pattern: impl Into<String>, severity: DiagnosticSeverity) -> Self {
        self.severity.insert(pattern.into(), severity);
        self
    }
}
