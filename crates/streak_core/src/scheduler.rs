use std::time::{Duration, Instant};

use tracing::debug;

use crate::store::{HabitStore, ResetSummary};

pub const RESET_INTERVAL: Duration = Duration::from_secs(60);

/// Cooperative timer for [`HabitStore::daily_reset`]. The first poll runs immediately, later
/// polls once per elapsed interval.
#[derive(Debug)]
pub struct DailyResetScheduler {
    interval: Duration,
    next_due: Option<Instant>,
    cancelled: bool,
}

impl DailyResetScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
            cancelled: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn poll(&mut self, now: Instant, store: &mut HabitStore) -> Option<ResetSummary> {
        if self.cancelled {
            return None;
        }
        if matches!(self.next_due, Some(due) if now < due) {
            return None;
        }
        let summary = store.daily_reset();
        self.next_due = Some(now + self.interval);
        debug!(changed = summary.changed(), "scheduled daily reset ran");
        Some(summary)
    }

    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        if self.cancelled {
            return None;
        }
        Some(
            self.next_due
                .map_or(Duration::ZERO, |due| due.saturating_duration_since(now)),
        )
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn cancel(&mut self) {
        if !self.cancelled {
            debug!("daily reset timer cleared");
            self.cancelled = true;
            self.next_due = None;
        }
    }
}

impl Default for DailyResetScheduler {
    fn default() -> Self {
        Self::new(RESET_INTERVAL)
    }
}
