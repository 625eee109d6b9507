use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::schedule::PrayerSchedule;

/// JSON file holding the last successfully fetched schedule.
#[derive(Debug, Clone)]
pub struct ScheduleCache {
    path: PathBuf,
}

impl ScheduleCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn data_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME").context("HOME environment variable not set")?;
        Ok(PathBuf::from(home).join(".local/share/prayer-clock"))
    }

    pub fn at_default_location() -> Result<Self> {
        Ok(Self::new(Self::data_dir()?.join("schedule.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing cache file is an empty schedule, not an error.
    pub fn load(&self) -> Result<PrayerSchedule> {
        if !self.path.exists() {
            return Ok(PrayerSchedule::new());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read schedule cache {}", self.path.display()))?;

        let schedule: PrayerSchedule = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse schedule cache {}", self.path.display()))?;

        info!(
            "Loaded {} day(s) of prayer times from {}",
            schedule.len(),
            self.path.display()
        );
        Ok(schedule)
    }

    pub fn save(&self, schedule: &PrayerSchedule) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).context("Failed to create data directory")?;
        }

        let content = serde_json::to_string(schedule).context("Failed to serialize schedule")?;

        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write schedule cache {}", self.path.display()))?;

        info!(
            "Saved {} day(s) of prayer times to {}",
            schedule.len(),
            self.path.display()
        );
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).context("Failed to remove schedule cache")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn strings(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let cache = ScheduleCache::new(dir.path().join("schedule.json"));
        assert!(cache.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_preserves_order() {
        let dir = TempDir::new().unwrap();
        let cache = ScheduleCache::new(dir.path().join("data/schedule.json"));

        let schedule: PrayerSchedule = [
            (
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                strings(&["06:49", "08:20", "13:15", "15:42", "18:01", "19:26"]),
            ),
            (
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                strings(&["19:00", "06:48", "bad"]),
            ),
        ]
        .into_iter()
        .collect();

        cache.save(&schedule).unwrap();
        let reloaded = cache.load().unwrap();
        assert_eq!(reloaded, schedule);
        assert_eq!(
            reloaded.times_for(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            strings(&["19:00", "06:48", "bad"]).as_slice()
        );
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schedule.json");
        fs::write(&path, "{not json").unwrap();

        assert!(ScheduleCache::new(&path).load().is_err());
    }

    #[test]
    fn clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let cache = ScheduleCache::new(dir.path().join("schedule.json"));
        cache.save(&PrayerSchedule::new()).unwrap();
        assert!(cache.path().exists());

        cache.clear().unwrap();
        assert!(!cache.path().exists());
        cache.clear().unwrap();
    }
}
