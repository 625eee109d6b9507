use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key format used for schedule days, both in memory and in the cache file.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a single `HH:MM` entry (24-hour, no seconds).
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime> {
    let (hours, minutes) = raw
        .split_once(':')
        .with_context(|| format!("time entry {raw:?} has no ':' separator"))?;

    let is_two_digits = |field: &str| field.len() == 2 && field.bytes().all(|b| b.is_ascii_digit());
    if !is_two_digits(hours) || !is_two_digits(minutes) {
        bail!("time entry {raw:?} is not in HH:MM form");
    }

    let hour: u32 = hours.parse().context("hour field is not a number")?;
    let minute: u32 = minutes.parse().context("minute field is not a number")?;

    NaiveTime::from_hms_opt(hour, minute, 0)
        .with_context(|| format!("time entry {raw:?} is out of range"))
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Prayer times per calendar day, exactly as supplied by a source.
///
/// Entries stay as raw strings so the cache round-trips byte-for-byte;
/// parsing happens lazily while resolving the next prayer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrayerSchedule {
    days: BTreeMap<String, Vec<String>>,
}

impl PrayerSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_day(&mut self, date: NaiveDate, times: Vec<String>) {
        self.days.insert(date_key(date), times);
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn times_for(&self, date: NaiveDate) -> &[String] {
        self.days
            .get(&date_key(date))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// True when the schedule has an entry for `date`, even an empty one.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date_key(date))
    }

    /// Next prayer instant strictly after `now`, looking at today and then
    /// the first usable entry of tomorrow.
    ///
    /// Entries are walked in list order without sorting, so unsorted data
    /// yields the first future entry rather than the chronologically
    /// earliest one.
    pub fn next_instant_after(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let today = now.date();
        let upcoming_today = self
            .parsed_times(today)
            .map(|time| today.and_time(time))
            .find(|instant| *instant > now);

        if upcoming_today.is_some() {
            return upcoming_today;
        }

        let tomorrow = today.succ_opt()?;
        self.parsed_times(tomorrow)
            .next()
            .map(|time| tomorrow.and_time(time))
    }

    fn parsed_times(&self, date: NaiveDate) -> impl Iterator<Item = NaiveTime> + '_ {
        self.times_for(date)
            .iter()
            .filter_map(move |raw| match parse_time_of_day(raw) {
                Ok(time) => Some(time),
                Err(err) => {
                    warn!("Skipping malformed prayer time on {}: {:#}", date, err);
                    None
                }
            })
    }
}

impl FromIterator<(NaiveDate, Vec<String>)> for PrayerSchedule {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, Vec<String>)>>(iter: I) -> Self {
        let mut schedule = Self::new();
        for (date, times) in iter {
            schedule.insert_day(date, times);
        }
        schedule
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, s).unwrap()
    }

    fn times(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|t| t.to_string()).collect()
    }

    fn sample() -> PrayerSchedule {
        [(
            date(2024, 1, 1),
            times(&["05:00", "13:00", "16:30", "19:45", "21:15"]),
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn parses_valid_times() {
        assert_eq!(
            parse_time_of_day("05:07").unwrap(),
            NaiveTime::from_hms_opt(5, 7, 0).unwrap()
        );
        assert_eq!(
            parse_time_of_day("23:59").unwrap(),
            NaiveTime::from_hms_opt(23, 59, 0).unwrap()
        );
        assert_eq!(
            parse_time_of_day("00:00").unwrap(),
            NaiveTime::from_hms_opt(0, 0, 0).unwrap()
        );
    }

    #[test]
    fn rejects_malformed_times() {
        for raw in ["", "5:00", "05:0", "05-00", "24:00", "12:60", "ab:cd", "05:00:00", " 05:00", "+5:00"] {
            assert!(parse_time_of_day(raw).is_err(), "{raw:?} should not parse");
        }
    }

    #[test]
    fn picks_first_future_entry_today() {
        let next = sample().next_instant_after(at(2024, 1, 1, 20, 0, 0));
        assert_eq!(next, Some(at(2024, 1, 1, 21, 15, 0)));
    }

    #[test]
    fn entry_equal_to_now_is_not_next() {
        let next = sample().next_instant_after(at(2024, 1, 1, 13, 0, 0));
        assert_eq!(next, Some(at(2024, 1, 1, 16, 30, 0)));
    }

    #[test]
    fn exhausted_today_without_tomorrow_is_absent() {
        assert_eq!(sample().next_instant_after(at(2024, 1, 1, 23, 50, 0)), None);
    }

    #[test]
    fn falls_back_to_first_entry_of_tomorrow() {
        let mut schedule = sample();
        schedule.insert_day(date(2024, 1, 2), times(&["05:01", "13:01"]));

        let next = schedule.next_instant_after(at(2024, 1, 1, 23, 50, 0));
        assert_eq!(next, Some(at(2024, 1, 2, 5, 1, 0)));
    }

    #[test]
    fn tomorrow_fallback_applies_when_today_is_missing() {
        let schedule: PrayerSchedule = [(date(2024, 3, 1), times(&["04:40"]))]
            .into_iter()
            .collect();

        let next = schedule.next_instant_after(at(2024, 2, 29, 10, 0, 0));
        assert_eq!(next, Some(at(2024, 3, 1, 4, 40, 0)));
    }

    #[test]
    fn empty_day_counts_as_no_data() {
        let mut schedule = PrayerSchedule::new();
        schedule.insert_day(date(2024, 1, 1), Vec::new());
        schedule.insert_day(date(2024, 1, 2), times(&["06:00"]));

        assert!(schedule.covers(date(2024, 1, 1)));
        assert_eq!(
            schedule.next_instant_after(at(2024, 1, 1, 8, 0, 0)),
            Some(at(2024, 1, 2, 6, 0, 0))
        );
    }

    #[test]
    fn malformed_entries_are_skipped_in_place() {
        let schedule: PrayerSchedule = [
            (date(2024, 1, 1), times(&["05:00", "bogus", "17:00"])),
            (date(2024, 1, 2), times(&["--:--", "05:02"])),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            schedule.next_instant_after(at(2024, 1, 1, 6, 0, 0)),
            Some(at(2024, 1, 1, 17, 0, 0))
        );
        assert_eq!(
            schedule.next_instant_after(at(2024, 1, 1, 18, 0, 0)),
            Some(at(2024, 1, 2, 5, 2, 0))
        );
    }

    #[test]
    fn unsorted_lists_use_list_order() {
        let schedule: PrayerSchedule = [(date(2024, 1, 1), times(&["18:00", "12:00"]))]
            .into_iter()
            .collect();

        assert_eq!(
            schedule.next_instant_after(at(2024, 1, 1, 9, 0, 0)),
            Some(at(2024, 1, 1, 18, 0, 0))
        );
    }

    #[test]
    fn crosses_year_boundary() {
        let schedule: PrayerSchedule = [
            (date(2024, 12, 31), times(&["06:00"])),
            (date(2025, 1, 1), times(&["06:01"])),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            schedule.next_instant_after(at(2024, 12, 31, 23, 59, 59)),
            Some(at(2025, 1, 1, 6, 1, 0))
        );
    }

    #[test]
    fn serializes_as_plain_date_map() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"2024-01-01":["05:00","13:00","16:30","19:45","21:15"]}"#
        );
    }
}
