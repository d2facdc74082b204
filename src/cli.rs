use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use culture_ledger::humanize::parse_duration;

#[derive(Parser, Debug)]
#[command(name = "culture-ledger")]
#[command(about = "Offline cache of culture records", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $CULTURE_LEDGER_CONFIG or config/culture-ledger.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Give up on network-bound commands after this long (e.g. "30s", "500ms")
    #[arg(long, global = true, value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List cached cultures and when each was last modified
    List,
    /// Print a cached culture as JSON
    Read { name: String },
    /// Download a culture into the cache, replacing any cached copy
    Add { name: String },
    /// Drop a culture from the cache
    Remove { name: String },
    /// Refresh cached cultures that changed remotely
    Update,
    /// Check that every indexed culture has a readable payload
    Audit,
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    parse_duration(value).map_err(|e| e.to_string())
}
