//! Scheduled session-token refresh.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::controller::HarmonyController;

/// When the background refresh fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    /// Refreshes fire on multiples of this interval since the Unix epoch,
    /// so the hourly default lands on the top of each hour.
    pub interval: Duration,
}

impl Default for RefreshSchedule {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
        }
    }
}

impl RefreshSchedule {
    pub fn every(interval: Duration) -> Self {
        Self { interval }
    }

    /// Time from `now` until the next boundary (strictly in the future).
    pub fn delay_until_next(&self, now: DateTime<Utc>) -> Duration {
        let interval = self.interval.as_secs().max(1);
        let into = now.timestamp().rem_euclid(interval as i64) as u64;
        Duration::from_secs(interval - into)
            .saturating_sub(Duration::from_nanos(u64::from(now.timestamp_subsec_nanos())))
            .max(Duration::from_millis(1))
    }
}

/// Spawns the refresh loop. It runs until `cancel` fires; a failed refresh
/// is logged by the controller and the loop carries on.
pub fn spawn_refresh(
    controller: Arc<HarmonyController>,
    schedule: RefreshSchedule,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let first = schedule.delay_until_next(Utc::now());
        info!(in_secs = first.as_secs(), "token refresh scheduled");

        let period = schedule.interval.max(Duration::from_secs(1));
        let mut ticker = tokio::time::interval_at(Instant::now() + first, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let _ = controller.refresh_token().await;
                }
            }
        }
        debug!("token refresh loop stopped");
    })
}
