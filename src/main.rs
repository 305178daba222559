mod cli;
mod commands;
mod config;
mod engine;
mod paths;
mod progress;
mod resource;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command, StateCommand};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    /// `--config`, if given
    pub config: Option<PathBuf>,
    /// `--state`, if given
    pub state: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        quiet: cli.quiet,
        config: cli.config,
        state: cli.state,
    };

    match cli.command {
        Command::Plan(args) => commands::lifecycle::plan(&ctx, args.target.as_deref()),
        Command::Apply(args) => commands::lifecycle::apply(&ctx, &args),
        Command::Refresh => commands::lifecycle::refresh(&ctx),
        Command::Import { address, id } => commands::state::import(&ctx, &address, &id),
        Command::Show => commands::state::show(&ctx),
        Command::State(StateCommand::Rm { address }) => commands::state::rm(&ctx, &address),
        Command::Destroy(args) => commands::lifecycle::destroy(&ctx, &args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "glvar", &mut io::stdout());
            Ok(())
        }
    }
}
