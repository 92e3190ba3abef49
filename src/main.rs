mod address;
mod cli;
mod commands;
mod config;
mod manifest;
mod mapper;
mod model;
mod resources;
mod schema;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    pub manifest_path: PathBuf,
    pub state_path: PathBuf,
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
        manifest_path: cli.file,
        state_path: cli.state,
    };

    match cli.command {
        Command::Validate => commands::inspect::validate(&ctx),
        Command::Plan(args) => commands::lifecycle::plan(&ctx, &args),
        Command::Apply(args) => commands::lifecycle::apply(&ctx, &args),
        Command::Refresh(args) => commands::lifecycle::refresh(&ctx, &args),
        Command::Import { address, id } => commands::lifecycle::import(&ctx, &address, &id),
        Command::Destroy(args) => commands::lifecycle::destroy(&ctx, &args),
        Command::Get { kind, id } => commands::inspect::get(&ctx, kind, &id),
        Command::Schema { kind } => commands::inspect::schema(kind),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "edcform", &mut io::stdout());
            Ok(())
        }
    }
}
