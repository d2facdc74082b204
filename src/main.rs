mod cli;
mod commands;

use clap::Parser;
use cli::Cli;

use culture_ledger::app;
use culture_ledger::config::Config;
use culture_ledger::deadline::Deadline;
use culture_ledger::observability;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    observability::init_tracing(&config.telemetry.log_filter);

    let ledger = app::build_ledger(&config)?;
    let deadline = cli.timeout.map(Deadline::after).unwrap_or_default();

    commands::run(&ledger, cli.command, deadline).await
}
