use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use mojo_conf::Settings;

use crate::args::Args;
use crate::commands::Command;
use crate::commands::project_root;
use crate::commands::MojoCommand;
use crate::logging;

/// Render and check logic-less templates.
#[derive(Parser, Debug)]
#[command(name = "mojo")]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: MojoCommand,

    #[command(flatten)]
    pub args: Args,
}

/// Parse arguments, set up logging and run the chosen command.
pub fn run(args: Vec<String>) -> Result<ExitCode> {
    let cli = Cli::try_parse_from(args).unwrap_or_else(|e| {
        e.exit();
    });

    logging::init_tracing(&cli.args.global, settings_debug());

    let exit = cli.command.execute(&cli.args)?;
    Ok(exit.report(cli.args.global.quiet))
}

/// The `debug` setting for the current project. Settings that fail to load
/// are reported again by the command itself, so this stays quiet.
fn settings_debug() -> bool {
    project_root()
        .ok()
        .and_then(|root| Settings::new(&root).ok())
        .is_some_and(|settings| settings.debug())
}
