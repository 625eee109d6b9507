use chrono::NaiveDate;
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::cache::ScheduleCache;
use crate::schedule::PrayerSchedule;
use crate::source::PrayerTimeSource;

/// Result of one background refresh, handed back to the tick loop.
#[derive(Debug)]
pub enum RefreshOutcome {
    Updated {
        district_id: String,
        schedule: PrayerSchedule,
    },
    Failed {
        reason: String,
    },
}

/// Cached data is stale as soon as it has no entry for today.
pub fn needs_refresh(schedule: &PrayerSchedule, today: NaiveDate) -> bool {
    !schedule.covers(today)
}

/// Fetches a schedule and writes it to the cache. A cache write failure is
/// logged but the fresh schedule is still used.
pub fn refresh(source: &dyn PrayerTimeSource, cache: &ScheduleCache, district_id: &str) -> RefreshOutcome {
    match source.fetch_schedule(district_id) {
        Ok(schedule) => {
            if let Err(err) = cache.save(&schedule) {
                error!("Failed to persist refreshed schedule: {:#}", err);
            }
            RefreshOutcome::Updated {
                district_id: district_id.to_string(),
                schedule,
            }
        }
        Err(err) => RefreshOutcome::Failed {
            reason: format!("{:#}", err),
        },
    }
}

/// Clears the in-flight flag even if the worker panics.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs refreshes on a worker thread, at most one at a time.
pub struct Refresher {
    source: Arc<dyn PrayerTimeSource>,
    cache: ScheduleCache,
    in_flight: Arc<AtomicBool>,
    last_attempt: Option<Instant>,
    retry_interval: Duration,
    outcomes: UnboundedSender<RefreshOutcome>,
}

impl Refresher {
    pub fn new(
        source: Arc<dyn PrayerTimeSource>,
        cache: ScheduleCache,
        retry_interval: Duration,
    ) -> (Self, UnboundedReceiver<RefreshOutcome>) {
        let (outcomes, receiver) = mpsc::unbounded_channel();
        let refresher = Self {
            source,
            cache,
            in_flight: Arc::new(AtomicBool::new(false)),
            last_attempt: None,
            retry_interval,
            outcomes,
        };
        (refresher, receiver)
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn set_retry_interval(&mut self, retry_interval: Duration) {
        self.retry_interval = retry_interval;
    }

    /// Automatic refresh: skipped while another runs or until the retry
    /// interval since the last attempt has elapsed.
    pub fn request_if_due(&mut self, district_id: &str, now: Instant) -> bool {
        let due = match self.last_attempt {
            Some(last) => now.saturating_duration_since(last) >= self.retry_interval,
            None => true,
        };
        due && self.start(district_id, now)
    }

    /// Manual refresh: ignores the retry interval but still coalesces.
    pub fn request(&mut self, district_id: &str) -> bool {
        self.start(district_id, Instant::now())
    }

    fn start(&mut self, district_id: &str, now: Instant) -> bool {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("Refresh already in progress, skipping request");
            return false;
        }
        self.last_attempt = Some(now);

        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        let source = Arc::clone(&self.source);
        let cache = self.cache.clone();
        let outcomes = self.outcomes.clone();
        let district_id = district_id.to_string();

        let spawned = thread::Builder::new()
            .name("schedule-refresh".to_string())
            .spawn(move || {
                info!("Refreshing prayer times for district {}", district_id);
                let outcome = refresh(source.as_ref(), &cache, &district_id);
                if let RefreshOutcome::Failed { reason } = &outcome {
                    warn!("Refresh for district {} failed: {}", district_id, reason);
                }
                // Receiver is gone once the app has shut down.
                let _ = outcomes.send(outcome);
                drop(guard);
            });

        match spawned {
            Ok(_) => true,
            Err(err) => {
                error!("Failed to spawn refresh worker: {}", err);
                let _ = self.outcomes.send(RefreshOutcome::Failed {
                    reason: format!("could not start refresh worker: {err}"),
                });
                false
            }
        }
    }
}
