//! Background task that periodically completes elapsed bookings.
//!
//! Runs in a tokio::spawn loop, asking the ledger every
//! `check_interval_secs` to move active bookings whose slot has ended to
//! `Completed`. The ledger update is conditional on `Active`, so a cancel
//! racing the sweep leaves each booking in exactly one terminal state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::{DomainResult, RepositoryProvider};
use crate::shared::shutdown::ShutdownSignal;

/// Start the completion sweep background task.
pub fn start_completion_sweep_task(
    repos: Arc<dyn RepositoryProvider>,
    shutdown: ShutdownSignal,
    check_interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            check_interval = check_interval_secs,
            "🧹 Booking completion sweep started"
        );

        let mut interval = tokio::time::interval(Duration::from_secs(check_interval_secs.max(1)));

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = sweep_once(repos.as_ref(), Utc::now()).await {
                        warn!(error = %e, transient = e.is_transient(), "Completion sweep error");
                    }
                }
                _ = shutdown.wait() => {
                    info!("🧹 Booking completion sweep shutting down");
                    break;
                }
            }
        }

        info!("🧹 Booking completion sweep stopped");
    })
}

/// One sweep pass. Returns the number of bookings completed.
pub async fn sweep_once(repos: &dyn RepositoryProvider, now: DateTime<Utc>) -> DomainResult<u64> {
    let completed = repos.bookings().complete_elapsed(now).await?;

    if completed > 0 {
        metrics::counter!("bookings_completed_total").increment(completed);
        info!(count = completed, "Completed elapsed bookings");
    } else {
        debug!("No elapsed bookings to complete");
    }
    Ok(completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BookingStatus, SlotClaim};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use chrono::Duration as ChronoDuration;

    fn claim(user: &str, start: DateTime<Utc>) -> SlotClaim {
        SlotClaim {
            user_id: user.into(),
            station_id: "S1".into(),
            slot_start: start,
            slot_end: start + ChronoDuration::minutes(30),
        }
    }

    #[tokio::test]
    async fn sweep_once_completes_elapsed_bookings() {
        let repos = InMemoryRepositoryProvider::new();
        let now = Utc::now();
        let past = repos
            .bookings()
            .claim(claim("alice", now - ChronoDuration::hours(2)))
            .await
            .unwrap();
        let future = repos
            .bookings()
            .claim(claim("bob", now + ChronoDuration::hours(2)))
            .await
            .unwrap();

        assert_eq!(sweep_once(&repos, now).await.unwrap(), 1);
        assert_eq!(sweep_once(&repos, now).await.unwrap(), 0);

        let past = repos.bookings().find_by_id(&past.id).await.unwrap().unwrap();
        let future = repos.bookings().find_by_id(&future.id).await.unwrap().unwrap();
        assert_eq!(past.status, BookingStatus::Completed);
        assert_eq!(future.status, BookingStatus::Active);
    }

    #[tokio::test]
    async fn task_runs_and_stops_on_shutdown() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let elapsed = repos
            .bookings()
            .claim(claim("alice", Utc::now() - ChronoDuration::hours(1)))
            .await
            .unwrap();

        let shutdown = ShutdownSignal::new();
        let handle = start_completion_sweep_task(repos.clone(), shutdown.clone(), 3600);

        // The first interval tick fires immediately.
        let mut status = BookingStatus::Active;
        for _ in 0..50 {
            status = repos.bookings().find_by_id(&elapsed.id).await.unwrap().unwrap().status;
            if status == BookingStatus::Completed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(status, BookingStatus::Completed);

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweep task did not stop")
            .unwrap();
    }
}
