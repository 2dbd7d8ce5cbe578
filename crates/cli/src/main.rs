//! Incubator monitor CLI
//!
//! A command-line tool for listing and acknowledging incubator alerts
//! and checking the incubator's current readings.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::alerts::{self, AlertState};
use commands::status;
use output::{print_error, OutputFormat};

/// Incubator monitor CLI
#[derive(Parser)]
#[command(name = "incubatorctl")]
#[command(author, version, about = "CLI for the Incubator Alert Monitor", long_about = None)]
pub struct Cli {
    /// Monitor API URL (can also be set via INCUBATOR_API_URL env var)
    #[arg(long, env = "INCUBATOR_API_URL")]
    pub api_url: Option<String>,

    /// Output format (defaults to the config file setting, then table)
    #[arg(long, short)]
    pub format: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect and acknowledge alerts
    #[command(subcommand)]
    Alerts(AlertCommands),

    /// Show latest readings and overall incubator status
    Status,

    /// Show configured alert thresholds
    Thresholds,
}

#[derive(Subcommand)]
pub enum AlertCommands {
    /// List alerts, newest first
    List {
        /// Filter by state
        #[arg(long, value_enum, default_value_t = AlertState::All)]
        state: AlertState,
    },

    /// Show a single alert
    Show {
        /// Alert ID
        id: String,
    },

    /// Acknowledge an alert
    Ack {
        /// Alert ID
        id: String,
    },

    /// Show alert counts
    Summary,
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::Config::load()?;
    let format = cli
        .format
        .or_else(|| config.default_format.as_deref().and_then(OutputFormat::from_name))
        .unwrap_or_default();

    let client = client::ApiClient::new(&config.resolve_api_url(cli.api_url))?;

    match cli.command {
        Commands::Alerts(alert_cmd) => match alert_cmd {
            AlertCommands::List { state } => alerts::list_alerts(&client, state, format).await?,
            AlertCommands::Show { id } => alerts::show_alert(&client, &id, format).await?,
            AlertCommands::Ack { id } => alerts::acknowledge_alert(&client, &id, format).await?,
            AlertCommands::Summary => alerts::show_summary(&client, format).await?,
        },
        Commands::Status => status::show_status(&client, format).await?,
        Commands::Thresholds => status::show_thresholds(&client, format).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
