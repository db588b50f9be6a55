mod cli;
mod commands;
mod error;
mod util;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() -> miette::Result<()> {
    let cli = Cli::parse_from(wild::args_os());

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Create(args) => commands::create(args)?,
        Commands::Extract(args) => commands::extract(args)?,
        Commands::List(args) => commands::list(args)?,
    };

    Ok(())
}
