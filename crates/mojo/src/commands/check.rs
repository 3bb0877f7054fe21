use std::io::IsTerminal;
use std::io::Read as _;

use anyhow::Context;
use anyhow::Result;
use camino::Utf8Path;
use camino::Utf8PathBuf;
use clap::Parser;
use mojo_conf::DiagnosticSeverity;
use mojo_conf::DiagnosticsConfig;
use mojo_conf::Settings;
use mojo_templates::ParseError;
use mojo_templates::Tags;
use rayon::prelude::*;

use crate::args::Args;
use crate::commands::Command;
use crate::diagnostics::Diagnostic;
use crate::diagnostics::DiagnosticRenderer;
use crate::diagnostics::Severity;
use crate::exit::Exit;
use crate::walk::walk_files;
use crate::walk::WalkOptions;

const STDIN_PATH: &str = "<stdin>";

#[derive(Debug, Parser)]
pub struct Check {
    /// Files or directories to check. Defaults to the current directory,
    /// or stdin when input is piped.
    paths: Vec<Utf8PathBuf>,

    /// Report these diagnostic codes as errors (e.g. T101,T102).
    #[arg(long, value_delimiter = ',')]
    select: Vec<String>,

    /// Silence these diagnostic codes (e.g. T102).
    #[arg(long, value_delimiter = ',')]
    ignore: Vec<String>,

    /// Also check hidden files and directories.
    #[arg(long)]
    hidden: bool,

    /// Do not respect `.gitignore` and `.ignore` files.
    #[arg(long)]
    no_ignore: bool,

    /// Only check files matching these globs; prefix with `!` to exclude.
    #[arg(long = "glob", short = 'g')]
    globs: Vec<String>,
}

impl Command for Check {
    fn execute(&self, _args: &Args) -> Result<Exit> {
        let project_root = super::project_root()?;
        let settings = Settings::new(&project_root).context("Failed to load settings")?;

        let config = build_diagnostics_config(&settings, &self.select, &self.ignore);
        let (open, close) = settings.tags();
        let tags = Tags::new(open, close);
        let fmt = pick_renderer();

        if self.paths.is_empty() && !std::io::stdin().is_terminal() {
            return check_stdin(&tags, &config, &fmt);
        }

        let files = self.discover_files(&project_root, &settings);
        tracing::debug!(count = files.len(), "discovered templates");

        if files.is_empty() {
            return Ok(Exit::success());
        }

        // Parsing is independent per file; rendering stays on this thread so
        // output order follows path order.
        let results: Vec<FileCheckResult> = files
            .into_par_iter()
            .filter_map(|path| check_file(path, &tags))
            .collect();

        let mut summary = Summary::default();
        for result in &results {
            summary.add(&result.report(&config, &fmt));
        }

        Ok(summary.into_exit())
    }
}

impl Check {
    fn discover_files(&self, project_root: &Utf8Path, settings: &Settings) -> Vec<Utf8PathBuf> {
        let roots: Vec<Utf8PathBuf> = if self.paths.is_empty() {
            vec![project_root.to_owned()]
        } else {
            self.paths
                .iter()
                .map(|p| {
                    if p.is_relative() {
                        project_root.join(p)
                    } else {
                        p.clone()
                    }
                })
                .collect()
        };

        let options = WalkOptions {
            hidden: self.hidden,
            no_ignore: self.no_ignore,
            globs: self.globs.clone(),
        };

        walk_files(&roots, |path| settings.is_template(path), &options)
    }
}

fn check_stdin(tags: &Tags, config: &DiagnosticsConfig, fmt: &DiagnosticRenderer) -> Result<Exit> {
    let mut source = String::new();
    std::io::stdin()
        .read_to_string(&mut source)
        .context("Failed to read stdin")?;

    let result = FileCheckResult::parse(Utf8PathBuf::from(STDIN_PATH), source, tags);
    let mut summary = Summary::default();
    summary.add(&result.report(config, fmt));
    Ok(summary.into_exit())
}

/// Parse errors found in one file, kept with the source they point into.
struct FileCheckResult {
    path: Utf8PathBuf,
    source: String,
    errors: Vec<ParseError>,
}

impl FileCheckResult {
    fn parse(path: Utf8PathBuf, source: String, tags: &Tags) -> Self {
        let template = mojo_templates::Parser::new(&source, tags.clone()).parse();
        let errors = template.errors().to_vec();
        Self {
            path,
            source,
            errors,
        }
    }

    /// Rendered diagnostics, with a flag for each telling whether it fails
    /// the run.
    fn report(&self, config: &DiagnosticsConfig, fmt: &DiagnosticRenderer) -> Vec<(String, bool)> {
        self.errors
            .iter()
            .filter_map(|error| {
                let configured = config.get_severity(error.diagnostic_code());
                let severity = Severity::from_config(configured)?;
                let diagnostic = Diagnostic::from_parse_error(
                    &self.source,
                    self.path.as_str(),
                    error,
                    severity,
                );
                Some((fmt.render(&diagnostic), configured.is_failure()))
            })
            .collect()
    }
}

/// `None` for files without problems or that could not be read.
fn check_file(path: Utf8PathBuf, tags: &Tags) -> Option<FileCheckResult> {
    let source = match std::fs::read_to_string(&path) {
        Ok(source) => source,
        Err(err) => {
            tracing::warn!(%path, error = %err, "could not read template, skipping");
            return None;
        }
    };

    let result = FileCheckResult::parse(path, source, tags);
    (!result.errors.is_empty()).then_some(result)
}

#[derive(Debug, Default)]
struct Summary {
    errors: usize,
    files: usize,
}

impl Summary {
    fn add(&mut self, rendered: &[(String, bool)]) {
        if rendered.is_empty() {
            return;
        }
        for (output, _) in rendered {
            println!("{output}\n");
        }
        let failures = rendered.iter().filter(|(_, failed)| *failed).count();
        if failures > 0 {
            self.errors += failures;
            self.files += 1;
        }
    }

    fn into_exit(self) -> Exit {
        if self.errors == 0 {
            return Exit::success();
        }
        let error_word = if self.errors == 1 { "error" } else { "errors" };
        let file_word = if self.files == 1 { "file" } else { "files" };
        Exit::error().with_message(format!(
            "Found {} {error_word} in {} {file_word}.",
            self.errors, self.files
        ))
    }
}

fn build_diagnostics_config(
    settings: &Settings,
    select: &[String],
    ignore: &[String],
) -> DiagnosticsConfig {
    let mut config = settings.diagnostics().clone();

    for code in select {
        config = config.with_severity(code.clone(), DiagnosticSeverity::Error);
    }

    for code in ignore {
        config = config.with_severity(code.clone(), DiagnosticSeverity::Off);
    }

    config
}

fn pick_renderer() -> DiagnosticRenderer {
    if std::io::stdout().is_terminal() {
        DiagnosticRenderer::styled()
    } else {
        DiagnosticRenderer::plain()
    }
}
