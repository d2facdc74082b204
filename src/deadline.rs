//! Optional deadlines for ledger and remote operations

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Point in time after which an operation should give up.
///
/// `Deadline::none()` never expires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

/// Returned when a deadline elapses before the wrapped future completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed;

impl Deadline {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    /// Deadline `duration` from now; one too far out to represent never expires
    pub fn after(duration: Duration) -> Self {
        Self(Instant::now().checked_add(duration))
    }

    pub fn instant(&self) -> Option<Instant> {
        self.0
    }

    /// Time left before expiry; `None` when there is no deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.0
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.remaining(), Some(left) if left.is_zero())
    }

    /// Cap `timeout` so it does not run past this deadline
    pub fn clamp(&self, timeout: Duration) -> Duration {
        match self.remaining() {
            Some(left) => timeout.min(left),
            None => timeout,
        }
    }

    /// Drive `fut` to completion or until the deadline passes
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Elapsed> {
        match self.0 {
            Some(at) => tokio::time::timeout_at(at, fut).await.map_err(|_| Elapsed),
            None => Ok(fut.await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_none_never_expires() {
        let deadline = Deadline::none();
        assert!(!deadline.is_expired());
        assert_eq!(deadline.remaining(), None);
        assert_eq!(deadline.clamp(Duration::from_secs(5)), Duration::from_secs(5));
        assert_eq!(deadline.run(async { 7 }).await, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_times_out() {
        let deadline = Deadline::after(Duration::from_millis(50));
        let result = deadline
            .run(tokio::time::sleep(Duration::from_secs(10)))
            .await;
        assert_eq!(result, Err(Elapsed));
        assert!(deadline.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clamp_to_remaining() {
        let deadline = Deadline::after(Duration::from_secs(2));
        assert!(deadline.clamp(Duration::from_secs(60)) <= Duration::from_secs(2));
        assert_eq!(
            deadline.clamp(Duration::from_millis(100)),
            Duration::from_millis(100)
        );
    }

    #[tokio::test]
    async fn test_unrepresentable_duration_means_no_deadline() {
        let deadline = Deadline::after(Duration::MAX);
        assert_eq!(deadline, Deadline::none());
        assert!(!deadline.is_expired());

        let huge = crate::humanize::parse_duration("18446744073709551615s").unwrap();
        assert_eq!(Deadline::after(huge).instant(), None);
    }
}
