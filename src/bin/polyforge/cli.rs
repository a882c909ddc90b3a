//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Polyforge - a multi-language build orchestrator
#[derive(Parser)]
#[command(name = "polyforge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the project's modules in dependency order
    Build(BuildArgs),

    /// Inspect the dependency graph and build schedule
    Graph(GraphArgs),

    /// List known cross-compilation targets and their availability
    Targets(TargetsArgs),

    /// Extract the exported interface from a compiled artifact
    Extract(ExtractArgs),

    /// Generate foreign-binding source from an interface description
    Glue(GlueArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Build in release mode
    #[arg(short, long)]
    pub release: bool,

    /// Build only this module and its dependencies
    #[arg(short, long)]
    pub module: Option<String>,

    /// Cross-compilation target triple (defaults to the host)
    #[arg(long)]
    pub target: Option<String>,

    /// Path to Forge.toml (defaults to the current directory)
    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args)]
pub struct GraphArgs {
    /// Emit the graph and schedule as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to Forge.toml (defaults to the current directory)
    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args)]
pub struct TargetsArgs {
    /// Validate each toolchain with a trial compile (slower)
    #[arg(long)]
    pub validate: bool,

    /// Emit the listing as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ExtractArgs {
    /// Path to the compiled artifact
    pub artifact: PathBuf,

    /// Source language of the artifact
    #[arg(short, long, default_value = "c")]
    pub language: String,

    /// Write the interface description to a file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct GlueArgs {
    /// Path to a saved interface description
    #[arg(short, long)]
    pub interface: PathBuf,

    /// Destination language (csharp, python, rust)
    #[arg(short, long)]
    pub to: String,

    /// Directory to write the generated binding file into
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,
}
