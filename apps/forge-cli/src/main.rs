//! # forge-cli
//!
//! Command-line frontend for the Forge engine.
//!
//! - `forge run "<line>"` — route one input line to Git or the selected
//!   agent, execute it as a goal, and stream its events to the terminal
//! - `forge route "<line>"` — print the route decision as JSON without
//!   creating a goal

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Forge — drive Git and coding agents from one input line.
#[derive(Parser)]
#[command(name = "forge", version, about)]
struct Cli {
    /// Repository directory Git operations run in (defaults to current
    /// directory).
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Engine configuration file (forge.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route an input line, run the resulting goal, stream its events.
    Run {
        /// The input line, e.g. "git status" or "explain this diff".
        line: String,
        /// Selected agent (local, claude, cursor, bgpt).
        #[arg(long, default_value = "local")]
        agent: String,
        /// Append every event to this JSONL journal.
        #[arg(long)]
        journal: Option<PathBuf>,
    },
    /// Print the route decision for an input line as JSON.
    Route {
        /// The input line to classify.
        line: String,
        /// Selected agent (local, claude, cursor, bgpt).
        #[arg(long, default_value = "local")]
        agent: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays clean for command output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Run {
            line,
            agent,
            journal,
        } => {
            commands::run::execute(
                line,
                agent,
                &cli.repo,
                cli.config.as_deref(),
                journal.as_deref(),
            )
            .await
        }
        Commands::Route { line, agent } => commands::route::execute(line, agent),
    }
}
