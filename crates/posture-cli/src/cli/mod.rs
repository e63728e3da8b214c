//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;

use crate::config::Config;
use crate::logging;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    logging::init(cli.verbose, cli.no_color);

    // Load configuration
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::path()?,
    };
    let config = Config::load_from(&config_path)?;

    // Flags override config values
    let output_format = cli
        .output
        .or(config.output_format)
        .unwrap_or_default();
    let results_dir = if cli.no_save {
        None
    } else {
        Some(cli.results_dir.unwrap_or_else(|| config.results_dir()))
    };

    // Create context for commands
    let ctx = commands::Context {
        config,
        config_path,
        output_format,
        results_dir,
        verbose: cli.verbose,
        no_color: cli.no_color,
    };

    // Dispatch to appropriate command
    match cli.command {
        Commands::Privesc(args) => commands::privesc::execute(ctx, args).await,
        Commands::Lateral(args) => commands::lateral::execute(ctx, args).await,
        Commands::All(args) => commands::all::execute(ctx, args).await,
        Commands::Config(args) => commands::config::execute(ctx, args).await,
    }
}
