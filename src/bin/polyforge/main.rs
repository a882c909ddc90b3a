//! Polyforge CLI - a multi-language build orchestrator

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("polyforge=debug")
    } else {
        EnvFilter::new("polyforge=info")
    };

    // Logs go to stderr so stdout stays clean for JSON and interface dumps.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Build(args) => commands::build::execute(args),
        Commands::Graph(args) => commands::graph::execute(args),
        Commands::Targets(args) => commands::targets::execute(args),
        Commands::Extract(args) => commands::extract::execute(args),
        Commands::Glue(args) => commands::glue::execute(args),
    }
}
