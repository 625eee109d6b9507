use anyhow::Result;

use crate::schedule::PrayerSchedule;

/// Anything that can produce a prayer schedule for a district.
pub trait PrayerTimeSource: Send + Sync {
    fn fetch_schedule(&self, district_id: &str) -> Result<PrayerSchedule>;
}
