//! Countdown to the next prayer time, for the floating clock widget and its
//! setup tool.

pub mod cache;
pub mod config;
pub mod countdown;
pub mod display;
pub mod diyanet;
pub mod engine;
pub mod geometry;
pub mod location;
pub mod refresh;
pub mod schedule;
pub mod source;
pub mod urgency;

pub use config::Settings;
pub use engine::{CountdownEngine, Frame, PresentationSink};
pub use schedule::PrayerSchedule;
pub use source::PrayerTimeSource;
