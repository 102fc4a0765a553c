//! ## ironwall-cli
//! **Operational front end for the Ironwall firewall and security monitor**
//!
//! Loads the layered configuration, builds both components and either
//! classifies a single packet or replays a traffic file through them.

use clap::Parser;
use ironwall_telemetry::EventLogger;

mod commands;
mod replay;

use commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    EventLogger::init(&config.telemetry.log_filter);

    commands::run_command(cli.command, &config).await
}
