mod catalog;
mod cli;
mod config;
mod db;
mod error;
mod index;
mod query;
mod server;
mod tools;
mod uri;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synthesis", version, about = "Resource & index consistency layer for hierarchical notebooks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (transport from config: stdio or http)
    Serve,
    /// Run database diagnostics and print a health report
    Doctor,
    /// Repair resource-index drift from primary-store truth
    Reindex {
        /// Entity id to reindex
        id: Option<String>,
        /// Repair every entity with a failed journal entry
        #[arg(long, conflicts_with = "id")]
        sweep: bool,
    },
    /// Print row counts per entity and index
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = config::SynthesisConfig::load()?;

    // Initialize tracing with the configured log level.
    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => match config.server.transport.as_str() {
            "http" => server::serve_http(config).await?,
            _ => server::serve_stdio(config).await?,
        },
        Command::Doctor => cli::doctor::doctor(&config)?,
        Command::Reindex { id, sweep } => {
            if sweep {
                cli::reindex::reindex_sweep(&config)?;
            } else if let Some(id) = id {
                cli::reindex::reindex_entity(&config, &id)?;
            } else {
                anyhow::bail!("specify an entity <ID> or --sweep");
            }
        }
        Command::Stats => cli::stats::stats(&config)?,
    }

    Ok(())
}
