use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::display::Orientation;
use crate::urgency::TierSettings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationSettings {
    pub city: Place,
    /// The district id is what the prayer-times source is queried with.
    pub district: Place,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            city: Place {
                name: "İstanbul".to_string(),
                id: "539".to_string(),
            },
            district: Place {
                name: "İSTANBUL".to_string(),
                id: "9541".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub orientation: Orientation,

    /// Show seconds and tick every second instead of every minute
    pub show_seconds: bool,

    /// Top-left corner of the clock window in screen coordinates
    pub position: Position,

    pub always_on_top: bool,

    /// Distance in pixels within which the window sticks to a screen edge
    pub snap_distance: f32,

    pub font_size: f32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            orientation: Orientation::Horizontal,
            show_seconds: true,
            position: Position { x: 1453.0, y: 0.0 },
            always_on_top: true,
            snap_distance: 20.0,
            font_size: 14.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshSettings {
    /// Upper bound for a single fetch of the prayer-times page
    pub fetch_timeout_secs: u64,

    /// Minimum gap between automatic refresh attempts while data is stale
    pub retry_interval_secs: u64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 15,
            retry_interval_secs: 300,
        }
    }
}

impl RefreshSettings {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub location: LocationSettings,
    pub tiers: TierSettings,
    pub display: DisplaySettings,
    pub refresh: RefreshSettings,

    /// Desktop notifications when a prayer time arrives or a refresh fails
    pub enable_notifications: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            location: LocationSettings::default(),
            tiers: TierSettings::default(),
            display: DisplaySettings::default(),
            refresh: RefreshSettings::default(),
            enable_notifications: true,
        }
    }
}

impl Settings {
    pub fn config_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME").context("HOME environment variable not set")?;
        Ok(PathBuf::from(home).join(".config/prayer-clock"))
    }

    pub fn settings_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("settings.json"))
    }

    /// Loads and validates settings, writing defaults first when the file
    /// does not exist. Keys missing from an existing file are filled from
    /// the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No settings at {}, writing defaults", path.display());
            let settings = Self::default();
            settings.save_to(path)?;
            return Ok(settings);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        let settings: Settings = serde_json::from_str(content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        settings
            .validate()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write settings file {}", path.display()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.location.district.id.trim().is_empty() {
            anyhow::bail!("District id must not be empty");
        }
        if self.display.font_size <= 0.0 {
            anyhow::bail!("Font size must be greater than 0");
        }
        if self.display.snap_distance < 0.0 {
            anyhow::bail!("Snap distance must not be negative");
        }
        if self.refresh.fetch_timeout_secs == 0 {
            anyhow::bail!("Fetch timeout must be greater than 0");
        }
        self.tiers.validate().context("Invalid tier settings")?;
        Ok(())
    }

    /// Redisplay cadence: every second with seconds shown, else every minute.
    pub fn tick_interval(&self) -> Duration {
        if self.display.show_seconds {
            Duration::from_secs(1)
        } else {
            Duration::from_secs(60)
        }
    }
}

/// Read-modify-write access to the settings file for long-running processes.
///
/// Every update re-reads the file and changes only the edited fields, so
/// edits made by other processes survive. A file that cannot be read or
/// parsed is never overwritten.
pub struct SettingsStore {
    path: PathBuf,
    seen: Option<String>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path, seen: None }
    }

    pub fn at_default_location() -> Result<Self> {
        Ok(Self::new(Settings::settings_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&mut self) -> Result<Settings> {
        let settings = Settings::load_from(&self.path)?;
        self.remember_contents();
        Ok(settings)
    }

    /// Applies `edit` on top of what is currently on disk and saves the
    /// result. Returns the settings as written.
    pub fn update(&mut self, edit: impl FnOnce(&mut Settings)) -> Result<Settings> {
        let mut settings = Settings::load_from(&self.path)
            .context("Refusing to overwrite unreadable settings")?;
        edit(&mut settings);
        settings.save_to(&self.path)?;
        self.remember_contents();
        Ok(settings)
    }

    /// Settings written by someone else since the last load or update.
    /// A broken file is reported once, not on every call.
    pub fn reload_if_changed(&mut self) -> Result<Option<Settings>> {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return Ok(None);
        };
        if self.seen.as_deref() == Some(content.as_str()) {
            return Ok(None);
        }
        let parsed = Settings::parse(&content, &self.path);
        self.seen = Some(content);
        parsed.map(Some)
    }

    fn remember_contents(&mut self) {
        self.seen = fs::read_to_string(&self.path).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/settings.json");

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(path.exists());
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r##"{"display":{"orientation":"vertical"},"tiers":{"warning":{"trigger":50,"background":"#111111","text":"#eeeeee"}}}"##,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.display.orientation, Orientation::Vertical);
        assert!(settings.display.show_seconds);
        assert_eq!(settings.display.snap_distance, 20.0);
        assert_eq!(settings.tiers.warning.trigger, 50);
        assert_eq!(settings.tiers.critical.trigger, 15);
        assert_eq!(settings.location.district.id, "9541");
        assert!(settings.enable_notifications);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = Settings::default();
        settings.display.show_seconds = false;
        settings.display.position = Position { x: 10.0, y: 42.0 };
        settings.location.district = Place {
            name: "KADIKÖY".to_string(),
            id: "9542".to_string(),
        };
        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn save_refuses_inverted_thresholds() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = Settings::default();
        settings.tiers.critical.trigger = 60;
        assert!(settings.save_to(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn tick_interval_follows_seconds_flag() {
        let mut settings = Settings::default();
        assert_eq!(settings.tick_interval(), Duration::from_secs(1));
        settings.display.show_seconds = false;
        assert_eq!(settings.tick_interval(), Duration::from_secs(60));
    }

    #[test]
    fn load_rejects_inverted_thresholds() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r##"{"tiers":{"critical":{"trigger":60,"background":"#c1121f","text":"#ffffff"}}}"##,
        )
        .unwrap();

        assert!(Settings::load_from(&path).is_err());
    }

    fn kadikoy() -> LocationSettings {
        LocationSettings {
            city: Place {
                name: "İstanbul".to_string(),
                id: "539".to_string(),
            },
            district: Place {
                name: "KADIKÖY".to_string(),
                id: "9542".to_string(),
            },
        }
    }

    #[test]
    fn store_update_keeps_location_written_by_another_process() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let mut store = SettingsStore::new(path.clone());
        store.load().unwrap();

        let mut external = Settings::load_from(&path).unwrap();
        external.location = kadikoy();
        external.save_to(&path).unwrap();

        let saved = store
            .update(|settings| settings.display.position = Position { x: 5.0, y: 7.0 })
            .unwrap();

        assert_eq!(saved.location, kadikoy());
        let on_disk = Settings::load_from(&path).unwrap();
        assert_eq!(on_disk.location, kadikoy());
        assert_eq!(on_disk.display.position, Position { x: 5.0, y: 7.0 });
    }

    #[test]
    fn store_never_overwrites_unreadable_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let broken = r#"{"display":{"font_size":"large"}}"#;
        fs::write(&path, broken).unwrap();

        let mut store = SettingsStore::new(path.clone());
        assert!(store.load().is_err());
        assert!(store
            .update(|settings| settings.display.show_seconds = false)
            .is_err());

        assert_eq!(fs::read_to_string(&path).unwrap(), broken);
    }

    #[test]
    fn store_update_refuses_invalid_edit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let mut store = SettingsStore::new(path.clone());
        store.load().unwrap();

        assert!(store
            .update(|settings| settings.tiers.imminent.trigger = 50)
            .is_err());
        assert_eq!(Settings::load_from(&path).unwrap(), Settings::default());
    }

    #[test]
    fn reload_reports_external_changes_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let mut store = SettingsStore::new(path.clone());
        store.load().unwrap();
        assert!(store.reload_if_changed().unwrap().is_none());

        let mut external = Settings::default();
        external.location = kadikoy();
        external.save_to(&path).unwrap();

        let reloaded = store.reload_if_changed().unwrap().unwrap();
        assert_eq!(reloaded.location, kadikoy());
        assert!(store.reload_if_changed().unwrap().is_none());

        store.update(|settings| settings.display.show_seconds = false).unwrap();
        assert!(store.reload_if_changed().unwrap().is_none());

        fs::write(&path, "{broken").unwrap();
        assert!(store.reload_if_changed().is_err());
        assert!(store.reload_if_changed().unwrap().is_none());
    }
}
