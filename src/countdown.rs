use chrono::NaiveDateTime;

use crate::schedule::PrayerSchedule;

/// Time left until the next prayer, never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Remaining {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Remaining {
    pub fn from_total_seconds(total_seconds: i64) -> Self {
        let total = u64::try_from(total_seconds).unwrap_or(0);
        Self {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }

    pub fn total_minutes(&self) -> u64 {
        self.hours * 60 + self.minutes
    }
}

/// Remaining time from `now` until `instant`, clamped to zero once passed.
pub fn remaining(instant: NaiveDateTime, now: NaiveDateTime) -> Remaining {
    Remaining::from_total_seconds((instant - now).num_seconds())
}

/// Tracks the resolved next prayer so the schedule is only searched again
/// once that prayer has passed or the schedule was replaced.
#[derive(Debug, Default)]
pub struct Countdown {
    target: Option<NaiveDateTime>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tracked target if `now` has reached it.
    pub fn reached(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        self.target.filter(|target| now >= *target)
    }

    pub fn resolve(&mut self, schedule: &PrayerSchedule, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let stale = match self.target {
            Some(target) => now >= target,
            None => true,
        };
        if stale {
            self.target = schedule.next_instant_after(now);
        }
        self.target
    }

    pub fn invalidate(&mut self) {
        self.target = None;
    }

    pub fn remaining(&self, now: NaiveDateTime) -> Option<Remaining> {
        self.target.map(|target| remaining(target, now))
    }
}
