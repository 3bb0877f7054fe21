use std::io::Read as _;
use std::io::Write as _;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use camino::Utf8Path;
use camino::Utf8PathBuf;
use clap::Parser;
use mojo_conf::Settings;
use mojo_templates::Engine;
use mojo_templates::Partials;
use mojo_templates::RenderConfig;
use mojo_templates::Tags;
use mojo_templates::Value;
use rustc_hash::FxHashMap;

use crate::args::Args;
use crate::commands::Command;
use crate::exit::Exit;
use crate::walk::walk_files;
use crate::walk::WalkOptions;

const STDIN: &str = "-";

#[derive(Debug, Parser)]
pub struct Render {
    /// Template file to render (`-` reads stdin).
    template: Utf8PathBuf,

    /// JSON file with the data to render against (`-` reads stdin).
    #[arg(long, short)]
    data: Option<Utf8PathBuf>,

    /// Directory of partial templates, named by file stem.
    #[arg(long, short)]
    partials: Option<Utf8PathBuf>,

    /// Delimiters to start with, e.g. "<% %>".
    #[arg(long)]
    tags: Option<String>,

    /// Wrap the data into self-resolving nodes before rendering.
    #[arg(long)]
    wrap: bool,
}

impl Command for Render {
    fn execute(&self, _args: &Args) -> Result<Exit> {
        let data_from_stdin = self.data.as_deref().is_some_and(|d| d.as_str() == STDIN);
        if self.template.as_str() == STDIN && data_from_stdin {
            bail!("Template and data cannot both be read from stdin");
        }

        let project_root = super::project_root()?;
        let settings = Settings::new(&project_root).context("Failed to load settings")?;

        let tags = match &self.tags {
            Some(pair) => Tags::parse(pair)
                .with_context(|| format!("Invalid --tags {pair:?}: expected two delimiters"))?,
            None => {
                let (open, close) = settings.tags();
                Tags::new(open, close)
            }
        };

        let source = read_input(&self.template).context("Failed to read template")?;
        let data = match &self.data {
            Some(path) => load_data(path)?,
            None => Value::Null,
        };
        let partials = match &self.partials {
            Some(dir) => load_partials(dir, &settings),
            None => FxHashMap::default(),
        };

        let engine = Engine::new().wrap_depth(settings.wrap_depth());
        let template = engine.parse(&source, Some(&tags));
        for error in template.errors() {
            tracing::warn!(
                template = %self.template,
                code = error.diagnostic_code(),
                offset = error.span().start,
                "{error}"
            );
        }

        let data = if self.wrap { engine.wrap(&data) } else { data };
        let output = engine.render_with(
            &source,
            &data,
            Partials::Map(&partials),
            &RenderConfig::with_tags(tags),
        );

        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(output.as_bytes())
            .and_then(|()| stdout.flush())
            .context("Failed to write output")?;

        Ok(Exit::success())
    }
}

fn read_input(path: &Utf8Path) -> Result<String> {
    if path.as_str() == STDIN {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Could not read {path}"))
}

fn load_data(path: &Utf8Path) -> Result<Value> {
    let text = read_input(path).context("Failed to read data")?;
    let json: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {path}"))?;
    Ok(Value::from(json))
}

/// Every template file under `dir`, keyed by file stem. When two files share
/// a stem the last one in path order wins.
fn load_partials(dir: &Utf8Path, settings: &Settings) -> FxHashMap<String, String> {
    let mut partials = FxHashMap::default();
    let files = walk_files(
        &[dir.to_owned()],
        |path| settings.is_template(path),
        &WalkOptions::default(),
    );

    for path in files {
        let Some(stem) = path.file_stem() else {
            continue;
        };
        match std::fs::read_to_string(&path) {
            Ok(source) => {
                tracing::debug!(%path, name = stem, "loaded partial");
                partials.insert(stem.to_string(), source);
            }
            Err(err) => tracing::warn!(%path, error = %err, "could not read partial"),
        }
    }

    partials
}
