//! # procsim-cli
//!
//! The main entry point for the procsim binary. It parses command-line
//! arguments and dispatches to the appropriate subcommand handler.

#![forbid(unsafe_code)]

use crate::args::{Cli, Command};
use anyhow::Result;
use clap::Parser;

mod args;
mod commands;
mod logging;
mod wiring;

fn main() -> Result<()> {
    let args = Cli::parse();

    // `run` installs its own subscriber once it knows the experiment's
    // replication count (attached as a span field on every log line); every
    // other command gets a plain one up front.
    if !matches!(args.command, Command::Run(_)) {
        tracing_subscriber::fmt().with_env_filter("info").init();
    }

    match args.command {
        Command::Run(opts) => commands::run::exec(opts),
        Command::Validate { scenario } => commands::validate::exec(scenario),
    }
}
