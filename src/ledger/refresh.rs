//! Refreshing cached cultures that are older than the remote copy

use tracing::{info, warn};

use super::error::{LedgerError, Result};
use super::Ledger;
use crate::culture::Catalogue;
use crate::deadline::Deadline;

/// Outcome of [`Ledger::update`]
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Remote catalogue entries compared against the index
    pub checked: usize,
    /// Cultures re-downloaded successfully
    pub refreshed: Vec<String>,
    /// Cultures whose refresh failed, with the reason
    pub failed: Vec<(String, LedgerError)>,
    /// Stale cultures removed locally before their refresh landed
    pub skipped: Vec<String>,
}

impl UpdateReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Cached entries whose remote copy is strictly newer, with the remote time
///
/// Remote entries that were never cached are ignored, as are cached entries
/// the remote no longer lists.
pub fn stale_entries(remote: &Catalogue, local: &Catalogue) -> Vec<(String, i64)> {
    remote
        .iter()
        .filter(|(name, remote_modified)| {
            local
                .get(name.as_str())
                .is_some_and(|cached| cached < *remote_modified)
        })
        .map(|(name, modified)| (name.clone(), *modified))
        .collect()
}

impl Ledger {
    /// Re-download every cached culture that changed remotely
    ///
    /// Only cultures already in the ledger are considered. A failed refresh is
    /// recorded in the report and does not stop the remaining refreshes.
    pub async fn update(&self) -> Result<UpdateReport> {
        self.update_within(&Deadline::none()).await
    }

    pub async fn update_within(&self, deadline: &Deadline) -> Result<UpdateReport> {
        let remote = deadline
            .run(self.remote.list_records(deadline))
            .await??;
        let local = self.list().await?;

        let stale = stale_entries(&remote, &local);
        let mut report = UpdateReport {
            checked: remote.len(),
            ..UpdateReport::default()
        };

        info!(
            remote = remote.len(),
            cached = local.len(),
            stale = stale.len(),
            "Updating ledger"
        );

        for (name, remote_modified) in stale {
            self.metrics.refresh_attempted();
            match self.fetch_and_store(&name, deadline, true).await {
                Ok(true) => report.refreshed.push(name),
                Ok(false) => report.skipped.push(name),
                Err(e) => {
                    self.metrics.refresh_failed();
                    warn!(name = %name, remote_modified, error = %e, "Failed to refresh culture");
                    report.failed.push((name, e));
                }
            }
        }

        info!(
            refreshed = report.refreshed.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "Ledger update finished"
        );
        Ok(report)
    }
}
