use anyhow::Result;
use bookwise::client::RecommendationClient;
use bookwise::config::Config;
use bookwise::{commands, logging, ui};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "bookwise")]
#[command(version)]
#[command(about = "Chat with the BookWise book recommendation assistant", long_about = None)]
struct Cli {
    /// Base URL of the recommendation service
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Use this config file instead of ~/.bookwise/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the reply
    Ask {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Check that the recommendation service is reachable
    Ping,
    /// Show the effective configuration
    Config {
        /// Write the effective configuration back to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_endpoint_override(cli.endpoint);

    let _log_guard = logging::init(&config.log_dir())?;
    info!(version = env!("CARGO_PKG_VERSION"), endpoint = %config.endpoint, "bookwise starting");

    match cli.command {
        None => {
            let client = RecommendationClient::new(&config)?;
            ui::run(&config, Arc::new(client)).await
        }
        Some(Commands::Ask { query }) => commands::ask_and_print(&config, &query.join(" ")).await,
        Some(Commands::Ping) => commands::ping(&config).await,
        Some(Commands::Config { save }) => commands::show_config(&config, save),
    }
}
