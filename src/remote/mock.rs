use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use super::{RemoteError, RemoteSource, Result};
use crate::culture::{Catalogue, Culture};
use crate::deadline::Deadline;

#[derive(Debug, Default)]
struct MockState {
    records: BTreeMap<String, Culture>,
    record_failures: HashMap<String, RemoteError>,
    catalogue_failure: Option<RemoteError>,
    latency: Option<Duration>,
    fetches: HashMap<String, usize>,
}

/// In-memory remote for development and tests
///
/// Records can be published, withdrawn and made to fail on demand.
#[derive(Debug, Default)]
pub struct MockRemote {
    state: Mutex<MockState>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = Culture>) -> Self {
        let remote = Self::new();
        for culture in records {
            remote.publish(culture);
        }
        remote
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add or replace a record
    pub fn publish(&self, culture: Culture) {
        self.state().records.insert(culture.name.clone(), culture);
    }

    pub fn withdraw(&self, name: &str) {
        self.state().records.remove(name);
    }

    /// Make every fetch of `name` fail with `error`
    pub fn fail_record(&self, name: &str, error: RemoteError) {
        self.state().record_failures.insert(name.to_string(), error);
    }

    pub fn fail_catalogue(&self, error: RemoteError) {
        self.state().catalogue_failure = Some(error);
    }

    /// Remove all injected failures
    pub fn heal(&self) {
        let mut state = self.state();
        state.record_failures.clear();
        state.catalogue_failure = None;
    }

    /// Delay every call by `latency`
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = Some(latency);
    }

    /// How many times `name` has been fetched
    pub fn fetch_count(&self, name: &str) -> usize {
        self.state().fetches.get(name).copied().unwrap_or(0)
    }

    async fn simulate_latency(&self, deadline: &Deadline) -> Result<()> {
        let latency = self.state().latency;
        if let Some(latency) = latency {
            deadline
                .run(tokio::time::sleep(latency))
                .await
                .map_err(|_| RemoteError::DeadlineExceeded)?;
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteSource for MockRemote {
    async fn get_record(&self, name: &str, deadline: &Deadline) -> Result<Culture> {
        self.simulate_latency(deadline).await?;

        let mut state = self.state();
        *state.fetches.entry(name.to_string()).or_default() += 1;

        if let Some(error) = state.record_failures.get(name) {
            return Err(error.clone());
        }

        let culture = state
            .records
            .get(name)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(name.to_string()))?;
        tracing::info!(name, modified = culture.modified, "Mock fetch");
        Ok(culture)
    }

    async fn list_records(&self, deadline: &Deadline) -> Result<Catalogue> {
        self.simulate_latency(deadline).await?;

        let state = self.state();
        if let Some(error) = &state.catalogue_failure {
            return Err(error.clone());
        }

        Ok(state
            .records
            .values()
            .map(|culture| (culture.name.clone(), culture.modified))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_and_fetch() {
        let remote = MockRemote::with_records([Culture::new("A", 100), Culture::new("B", 200)]);

        let culture = remote.get_record("A", &Deadline::none()).await.unwrap();
        assert_eq!(culture.modified, 100);
        assert_eq!(remote.fetch_count("A"), 1);

        let catalogue = remote.list_records(&Deadline::none()).await.unwrap();
        assert_eq!(catalogue.get("B"), Some(&200));
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let remote = MockRemote::new();
        let result = remote.get_record("ghost", &Deadline::none()).await;
        assert_eq!(result, Err(RemoteError::NotFound("ghost".to_string())));
    }

    #[tokio::test]
    async fn test_injected_failures_and_heal() {
        let remote = MockRemote::with_records([Culture::new("A", 1)]);
        remote.fail_record("A", RemoteError::Network("offline".to_string()));
        remote.fail_catalogue(RemoteError::Server {
            status: 503,
            message: "Service Unavailable".to_string(),
        });

        assert!(remote.get_record("A", &Deadline::none()).await.is_err());
        assert!(remote.list_records(&Deadline::none()).await.is_err());

        remote.heal();
        assert!(remote.get_record("A", &Deadline::none()).await.is_ok());
        assert!(remote.list_records(&Deadline::none()).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_respects_deadline() {
        let remote = MockRemote::with_records([Culture::new("A", 1)]);
        remote.set_latency(Duration::from_secs(5));

        let deadline = Deadline::after(Duration::from_millis(10));
        let result = remote.get_record("A", &deadline).await;
        assert_eq!(result, Err(RemoteError::DeadlineExceeded));
        assert_eq!(remote.fetch_count("A"), 0);
    }
}
