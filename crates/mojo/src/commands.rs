mod check;
mod render;

use anyhow::Context;
use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Subcommand;

use crate::args::Args;
use crate::exit::Exit;

pub trait Command {
    fn execute(&self, args: &Args) -> Result<Exit>;
}

#[derive(Debug, Subcommand)]
pub enum MojoCommand {
    /// Render a template with JSON data
    Render(self::render::Render),
    /// Report parse problems in template files
    Check(self::check::Check),
}

impl Command for MojoCommand {
    fn execute(&self, args: &Args) -> Result<Exit> {
        match self {
            MojoCommand::Render(cmd) => cmd.execute(args),
            MojoCommand::Check(cmd) => cmd.execute(args),
        }
    }
}

/// The working directory as a UTF-8 path; settings are loaded relative to it.
pub fn project_root() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    Utf8PathBuf::from_path_buf(cwd)
        .map_err(|_| anyhow::anyhow!("Current directory is not valid UTF-8"))
}
