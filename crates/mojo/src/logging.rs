//! Tracing setup for the command line.
//!
//! Events go to stderr so rendered output on stdout stays clean. `RUST_LOG`
//! wins over the verbosity flags when it is set.

use std::io::IsTerminal;

use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;

use crate::args::GlobalArgs;

/// Default filter directive for the given flags. `debug` comes from the
/// settings file and only applies when no verbosity flag was passed.
pub fn default_directive(global: &GlobalArgs, debug: bool) -> &'static str {
    if global.quiet {
        return "error";
    }
    match global.verbose {
        0 if debug => "debug",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the stderr subscriber. Safe to call more than once; later calls
/// leave the first subscriber in place.
pub fn init_tracing(global: &GlobalArgs, debug: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(global, debug)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(global.verbose > 1)
        .without_time()
        .with_filter(env_filter);

    if Registry::default().with(stderr_layer).try_init().is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
