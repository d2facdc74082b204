use chrono::{DateTime, SecondsFormat};

use culture_ledger::deadline::Deadline;
use culture_ledger::ledger::Ledger;

use crate::cli::Commands;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn run(ledger: &Ledger, command: Commands, deadline: Deadline) -> Result<(), AnyError> {
    match command {
        Commands::List => list(ledger).await,
        Commands::Read { name } => {
            let culture = ledger.read_within(&name, &deadline).await?;
            println!("{}", serde_json::to_string_pretty(&culture)?);
            Ok(())
        }
        Commands::Add { name } => {
            ledger.add_within(&name, &deadline).await?;
            println!("cached {}", name);
            Ok(())
        }
        Commands::Remove { name } => {
            ledger.remove(&name).await?;
            println!("removed {}", name);
            Ok(())
        }
        Commands::Update => update(ledger, deadline).await,
        Commands::Audit => audit(ledger).await,
    }
}

async fn list(ledger: &Ledger) -> Result<(), AnyError> {
    let cultures = ledger.list().await?;
    if cultures.is_empty() {
        println!("no cultures cached");
        return Ok(());
    }

    let width = cultures.keys().map(String::len).max().unwrap_or(0);
    for (name, modified) in &cultures {
        let when = DateTime::from_timestamp_millis(*modified)
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| modified.to_string());
        println!("{:<width$}  {}", name, when, width = width);
    }
    Ok(())
}

async fn update(ledger: &Ledger, deadline: Deadline) -> Result<(), AnyError> {
    let report = ledger.update_within(&deadline).await?;

    println!(
        "checked {} remote cultures, refreshed {}",
        report.checked,
        report.refreshed.len()
    );
    for name in &report.refreshed {
        println!("  refreshed {}", name);
    }
    for name in &report.skipped {
        println!("  skipped   {} (removed during update)", name);
    }
    for (name, error) in &report.failed {
        println!("  failed    {}: {}", name, error);
    }

    if report.is_complete() {
        Ok(())
    } else {
        Err(format!("{} refreshes failed", report.failed.len()).into())
    }
}

async fn audit(ledger: &Ledger) -> Result<(), AnyError> {
    let report = ledger.audit().await?;

    println!("{} healthy", report.healthy.len());
    for name in &report.missing {
        println!("  missing payload  {}", name);
    }
    for (name, reason) in &report.undecodable {
        println!("  unreadable       {}: {}", name, reason);
    }

    if report.is_clean() {
        Ok(())
    } else {
        Err("ledger has inconsistent entries".into())
    }
}
