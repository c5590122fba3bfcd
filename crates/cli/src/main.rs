use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "simtrack")]
#[command(about = "SIM provisioning and SMS reconciliation server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server with the background reconcile poller.
    Serve {
        #[arg(short, long, default_value = "38080")]
        port: u16,
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Run one reconciliation cycle and print the report.
    Reconcile,
    /// Provision device reports from a JSON file and print the report.
    Provision {
        /// Path to a JSON array of gateway device reports.
        file: std::path::PathBuf,
    },
    /// Delete retired numbers at the provider and print the report.
    Cleanup,
    /// Retire every active number from the registry pool.
    RetireAll,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Serve { port, host } => commands::serve::run(config, host, port).await,
        Commands::Reconcile => commands::ops::reconcile(config).await,
        Commands::Provision { file } => commands::ops::provision(config, &file).await,
        Commands::Cleanup => commands::ops::cleanup(config).await,
        Commands::RetireAll => commands::ops::retire_all(config).await,
    }
}
