//! Mosaic CLI: the `mosaic` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let filter =
        EnvFilter::try_from_env("MOSAIC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Deps { command } => commands::deps::run(command),

        Commands::Why { dep, deep, json } => commands::deps::run_usage(dep, deep, json),

        Commands::Status { id, json } => commands::status::run(id, json),

        Commands::Snap { pattern, message, tag, author, email, json } => {
            commands::snap::run(pattern, message, tag, author, email, json)
        }
    }
}
