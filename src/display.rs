use serde::{Deserialize, Serialize};

use crate::countdown::Remaining;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn separator(&self) -> &'static str {
        match self {
            Orientation::Horizontal => ":",
            Orientation::Vertical => "\n",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

/// Shown instead of a countdown when no prayer can be resolved.
pub fn placeholder(orientation: Orientation) -> String {
    ["--", "--"].join(orientation.separator())
}

pub fn format(
    hours: u64,
    minutes: u64,
    seconds: u64,
    orientation: Orientation,
    show_seconds: bool,
) -> String {
    let mut parts = Vec::with_capacity(3);
    if hours > 0 {
        parts.push(hours.to_string());
    }
    parts.push(format!("{:02}", minutes));
    if show_seconds {
        parts.push(format!("{:02}", seconds));
    }
    parts.join(orientation.separator())
}

pub fn format_remaining(remaining: &Remaining, orientation: Orientation, show_seconds: bool) -> String {
    format(
        remaining.hours,
        remaining.minutes,
        remaining.seconds,
        orientation,
        show_seconds,
    )
}
