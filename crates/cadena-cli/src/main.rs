//! Cadena CLI - Command-line interface for cadena filter chains.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cadena")]
#[command(author, version, about = "Audio format negotiation and filter chains", long_about = None)]
struct Cli {
    /// Log every negotiation step (default log level `debug`)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in filters and their parameters
    Filters(commands::filters::FiltersArgs),

    /// List standard channel layouts and speaker names
    Layouts(commands::layouts::LayoutsArgs),

    /// Pick the output layout a policy selects for a channel map
    Select(commands::select::SelectArgs),

    /// Negotiate a filter chain, print it, and pump test audio through it
    Negotiate(commands::negotiate::NegotiateArgs),

    /// Create, check and show chain presets
    Preset(commands::preset::PresetArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Filters(args) => commands::filters::run(args),
        Commands::Layouts(args) => commands::layouts::run(args),
        Commands::Select(args) => commands::select::run(args),
        Commands::Negotiate(args) => commands::negotiate::run(args),
        Commands::Preset(args) => commands::preset::run(args),
    }
}
