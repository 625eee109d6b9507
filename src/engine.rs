use chrono::NaiveDateTime;
use log::{info, warn};
use std::time::Instant;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::Settings;
use crate::countdown::{Countdown, Remaining};
use crate::display::{format_remaining, placeholder};
use crate::refresh::{needs_refresh, RefreshOutcome, Refresher};
use crate::schedule::PrayerSchedule;
use crate::urgency::{ColorPair, UrgencyTier};

/// What the presentation layer gets told. Colors are `#rrggbb` strings.
pub trait PresentationSink {
    fn on_tick(&mut self, text: &str, background: &str, foreground: &str);

    fn on_refresh_completed(&mut self, success: bool);

    /// A tracked prayer time was reached since the previous tick.
    fn on_prayer_time(&mut self, _instant: NaiveDateTime) {}
}

/// Everything rendered on one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub text: String,
    pub tier: UrgencyTier,
    pub colors: ColorPair,
    pub target: Option<NaiveDateTime>,
    pub remaining: Option<Remaining>,
}

/// Owns the current schedule and turns it into a frame on every tick.
pub struct CountdownEngine {
    schedule: PrayerSchedule,
    countdown: Countdown,
    refresher: Refresher,
    outcomes: UnboundedReceiver<RefreshOutcome>,
    relocate_pending: bool,
}

impl CountdownEngine {
    pub fn new(
        schedule: PrayerSchedule,
        refresher: Refresher,
        outcomes: UnboundedReceiver<RefreshOutcome>,
    ) -> Self {
        Self {
            schedule,
            countdown: Countdown::new(),
            refresher,
            outcomes,
            relocate_pending: false,
        }
    }

    pub fn schedule(&self) -> &PrayerSchedule {
        &self.schedule
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresher.is_in_flight()
    }

    /// User-triggered refresh. Returns false when one is already running.
    pub fn request_refresh(&mut self, district_id: &str) -> bool {
        self.refresher.request(district_id)
    }

    /// Forgets the schedule of the previous district. The new district is
    /// fetched on the next tick, or as soon as a running refresh finishes.
    pub fn relocate(&mut self) {
        self.schedule = PrayerSchedule::new();
        self.countdown.invalidate();
        self.relocate_pending = true;
    }

    pub fn tick(
        &mut self,
        now: NaiveDateTime,
        settings: &Settings,
        sink: &mut dyn PresentationSink,
    ) -> Frame {
        let district_id = settings.location.district.id.as_str();
        self.apply_outcomes(district_id, sink);

        if self.relocate_pending {
            if self.refresher.request(district_id) {
                self.relocate_pending = false;
            }
        } else if needs_refresh(&self.schedule, now.date()) {
            self.refresher
                .set_retry_interval(settings.refresh.retry_interval());
            self.refresher.request_if_due(district_id, Instant::now());
        }

        if let Some(reached) = self.countdown.reached(now) {
            info!("Prayer time {} reached", reached);
            sink.on_prayer_time(reached);
        }

        let target = self.countdown.resolve(&self.schedule, now);
        let remaining = self.countdown.remaining(now);
        let display = &settings.display;

        let (text, tier) = match remaining {
            Some(left) => (
                format_remaining(&left, display.orientation, display.show_seconds),
                settings.tiers.classify_remaining(&left),
            ),
            None => (placeholder(display.orientation), UrgencyTier::Normal),
        };
        let colors = settings.tiers.colors(tier).clone();

        sink.on_tick(&text, &colors.background, &colors.text);

        Frame {
            text,
            tier,
            colors,
            target,
            remaining,
        }
    }

    fn apply_outcomes(&mut self, district_id: &str, sink: &mut dyn PresentationSink) {
        while let Ok(outcome) = self.outcomes.try_recv() {
            match outcome {
                RefreshOutcome::Updated {
                    district_id: fetched_for,
                    ..
                } if fetched_for != district_id => {
                    info!("Discarding schedule fetched for previous district {}", fetched_for);
                }
                RefreshOutcome::Updated { schedule, .. } => {
                    info!("Schedule refreshed with {} day(s)", schedule.len());
                    self.schedule = schedule;
                    self.countdown.invalidate();
                    sink.on_refresh_completed(true);
                }
                RefreshOutcome::Failed { reason } => {
                    warn!("Keeping previous schedule after failed refresh: {}", reason);
                    sink.on_refresh_completed(false);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ScheduleCache;
    use crate::display::Orientation;
    use crate::source::PrayerTimeSource;
    use anyhow::{bail, Result};
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        ticks: Vec<(String, String, String)>,
        refreshes: Vec<bool>,
        prayers: Vec<NaiveDateTime>,
    }

    impl PresentationSink for Recorder {
        fn on_tick(&mut self, text: &str, background: &str, foreground: &str) {
            self.ticks
                .push((text.to_string(), background.to_string(), foreground.to_string()));
        }

        fn on_refresh_completed(&mut self, success: bool) {
            self.refreshes.push(success);
        }

        fn on_prayer_time(&mut self, instant: NaiveDateTime) {
            self.prayers.push(instant);
        }
    }

    struct CountingSource {
        calls: AtomicUsize,
    }

    impl PrayerTimeSource for CountingSource {
        fn fetch_schedule(&self, _district_id: &str) -> Result<PrayerSchedule> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            bail!("offline")
        }
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn sample() -> PrayerSchedule {
        [(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            ["05:00", "13:00", "16:30", "19:45", "21:15"]
                .map(String::from)
                .to_vec(),
        )]
        .into_iter()
        .collect()
    }

    fn engine(schedule: PrayerSchedule, dir: &TempDir) -> (CountdownEngine, Arc<CountingSource>) {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let cache = ScheduleCache::new(dir.path().join("schedule.json"));
        let (refresher, outcomes) = Refresher::new(source.clone(), cache, Duration::from_secs(300));
        (CountdownEngine::new(schedule, refresher, outcomes), source)
    }

    #[test]
    fn evening_scenario_renders_normal_countdown() {
        let dir = TempDir::new().unwrap();
        let (mut engine, source) = engine(sample(), &dir);
        let mut sink = Recorder::default();
        let settings = Settings::default();

        let frame = engine.tick(at(20, 0, 0), &settings, &mut sink);

        assert_eq!(frame.target, Some(at(21, 15, 0)));
        assert_eq!(
            frame.remaining,
            Some(Remaining {
                hours: 1,
                minutes: 15,
                seconds: 0
            })
        );
        assert_eq!(frame.tier, UrgencyTier::Normal);
        assert_eq!(frame.text, "1:15:00");
        assert_eq!(
            sink.ticks,
            vec![(
                "1:15:00".to_string(),
                "#0a1932".to_string(),
                "#ffffff".to_string()
            )]
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn exhausted_day_renders_placeholder() {
        let dir = TempDir::new().unwrap();
        let (mut engine, _) = engine(sample(), &dir);
        let mut sink = Recorder::default();

        let frame = engine.tick(at(23, 50, 0), &Settings::default(), &mut sink);

        assert_eq!(frame.target, None);
        assert_eq!(frame.text, "--:--");
        assert_eq!(frame.tier, UrgencyTier::Normal);
    }

    #[test]
    fn colors_follow_tier_and_orientation_applies() {
        let dir = TempDir::new().unwrap();
        let (mut engine, _) = engine(sample(), &dir);
        let mut sink = Recorder::default();
        let mut settings = Settings::default();
        settings.display.orientation = Orientation::Vertical;

        let frame = engine.tick(at(21, 5, 30), &settings, &mut sink);

        assert_eq!(frame.tier, UrgencyTier::Critical);
        assert_eq!(frame.text, "09\n30");
        assert_eq!(frame.colors.background, "#c1121f");
    }

    #[test]
    fn reports_reached_prayer_once() {
        let dir = TempDir::new().unwrap();
        let (mut engine, _) = engine(sample(), &dir);
        let mut sink = Recorder::default();
        let settings = Settings::default();

        engine.tick(at(21, 14, 59), &settings, &mut sink);
        let frame = engine.tick(at(21, 15, 0), &settings, &mut sink);
        engine.tick(at(21, 15, 1), &settings, &mut sink);

        assert_eq!(sink.prayers, vec![at(21, 15, 0)]);
        assert_eq!(frame.text, "--:--");
    }

    #[test]
    fn stale_schedule_triggers_single_rate_limited_refresh() {
        let dir = TempDir::new().unwrap();
        let (mut engine, source) = engine(PrayerSchedule::new(), &dir);
        let mut sink = Recorder::default();
        let settings = Settings::default();

        engine.tick(at(12, 0, 0), &settings, &mut sink);

        let deadline = Instant::now() + Duration::from_secs(5);
        while sink.refreshes.is_empty() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
            engine.tick(at(12, 0, 1), &settings, &mut sink);
        }

        assert_eq!(sink.refreshes, vec![false]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(sink.ticks.iter().all(|(text, _, _)| text == "--:--"));
    }

    /// Serves a single evening prayer whose time depends on the district.
    struct PerDistrictSource;

    impl PrayerTimeSource for PerDistrictSource {
        fn fetch_schedule(&self, district_id: &str) -> Result<PrayerSchedule> {
            let time = if district_id == "9541" { "21:40" } else { "21:30" };
            Ok([(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                vec![time.to_string()],
            )]
            .into_iter()
            .collect())
        }
    }

    fn per_district_engine(dir: &TempDir) -> CountdownEngine {
        let cache = ScheduleCache::new(dir.path().join("schedule.json"));
        let (refresher, outcomes) =
            Refresher::new(Arc::new(PerDistrictSource), cache, Duration::from_secs(300));
        CountdownEngine::new(sample(), refresher, outcomes)
    }

    #[test]
    fn relocation_fetches_the_new_district() {
        let dir = TempDir::new().unwrap();
        let mut engine = per_district_engine(&dir);
        let mut sink = Recorder::default();
        let mut settings = Settings::default();
        settings.location.district.id = "9206".to_string();

        engine.relocate();
        let first = engine.tick(at(20, 0, 0), &settings, &mut sink);
        assert_eq!(first.text, "--:--");

        let deadline = Instant::now() + Duration::from_secs(5);
        while sink.refreshes.is_empty() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
            engine.tick(at(20, 0, 0), &settings, &mut sink);
        }

        let frame = engine.tick(at(20, 0, 0), &settings, &mut sink);
        assert_eq!(sink.refreshes, vec![true]);
        assert_eq!(frame.target, Some(at(21, 30, 0)));
    }

    #[test]
    fn schedule_for_previous_district_is_discarded() {
        let dir = TempDir::new().unwrap();
        let mut engine = per_district_engine(&dir);
        let mut sink = Recorder::default();
        let mut settings = Settings::default();

        assert!(engine.request_refresh("9541"));
        let deadline = Instant::now() + Duration::from_secs(5);
        while engine.is_refreshing() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }

        settings.location.district.id = "9206".to_string();
        let frame = engine.tick(at(20, 0, 0), &settings, &mut sink);

        assert!(sink.refreshes.is_empty());
        assert_eq!(frame.target, Some(at(21, 15, 0)));
    }
}
