//! workloader - PCE workload tooling
//!
//! Commands:
//! - `wkld-replicate`: keep workloads replicated across several PCEs
//! - `pce-list`: show the configured PCEs

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workloader_client::HttpPceClient;

mod commands;
mod config;
mod error;
mod output;

use commands::{pce, replicate};
use config::PceRegistry;
use error::CliResult;

/// workloader application
#[derive(Parser)]
#[command(name = "workloader")]
#[command(about = "workloader - PCE workload tooling", long_about = None)]
#[command(version)]
struct Cli {
    /// PCE registry file path
    #[arg(short, long, env = "WORKLOADER_CONFIG", global = true)]
    config: Option<String>,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table", global = true)]
    output: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Apply changes to the PCEs; without it commands only write their files
    #[arg(long, global = true)]
    update_pce: bool,

    /// Do not ask for confirmation before applying changes
    #[arg(long, global = true)]
    no_prompt: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Replicate workloads between PCEs
    #[command(name = "wkld-replicate", alias = "replicate")]
    WkldReplicate(replicate::ReplicateArgs),

    /// List configured PCEs
    #[command(name = "pce-list")]
    PceList,
}

async fn run(cli: Cli) -> CliResult<()> {
    let registry = PceRegistry::load(cli.config.as_deref())?;
    tracing::debug!(pces = ?registry.names(), "Loaded pce registry");

    match cli.command {
        Commands::WkldReplicate(args) => {
            let client = HttpPceClient::new(registry.pces.clone())?;
            replicate::execute(args, &client, cli.update_pce, cli.no_prompt, cli.output).await
        }
        Commands::PceList => pce::list(&registry, cli.output),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(e) = run(cli).await {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}
