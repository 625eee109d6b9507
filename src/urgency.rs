use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::countdown::Remaining;

/// How close the next prayer is, from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrgencyTier {
    Normal,
    Warning,
    Critical,
    Imminent,
}

impl UrgencyTier {
    pub const ALL: [UrgencyTier; 4] = [
        UrgencyTier::Normal,
        UrgencyTier::Warning,
        UrgencyTier::Critical,
        UrgencyTier::Imminent,
    ];

    pub fn display_name(&self) -> &str {
        match self {
            UrgencyTier::Normal => "Normal",
            UrgencyTier::Warning => "Warning",
            UrgencyTier::Critical => "Critical",
            UrgencyTier::Imminent => "Imminent",
        }
    }
}

/// Background and text color as `#rrggbb` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPair {
    pub background: String,
    pub text: String,
}

impl ColorPair {
    pub fn new(background: &str, text: &str) -> Self {
        Self {
            background: background.to_string(),
            text: text.to_string(),
        }
    }

    pub fn background_rgb(&self) -> Result<u32> {
        parse_hex_color(&self.background)
    }

    pub fn text_rgb(&self) -> Result<u32> {
        parse_hex_color(&self.text)
    }
}

/// Backgrounds the clock's menu cycles through.
pub const PALETTE: [&str; 8] = [
    "#0a1932", "#540000", "#c1121f", "#ffa340", "#1b4332", "#3c096c", "#264653", "#000000",
];

/// The palette entry after `current`, or the first one for colors outside it.
pub fn next_palette_color(current: &str) -> &'static str {
    let position = PALETTE
        .iter()
        .position(|color| color.eq_ignore_ascii_case(current));
    match position {
        Some(index) => PALETTE[(index + 1) % PALETTE.len()],
        None => PALETTE[0],
    }
}

pub fn parse_hex_color(raw: &str) -> Result<u32> {
    let hex = raw
        .strip_prefix('#')
        .with_context(|| format!("color {raw:?} must start with '#'"))?;
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        bail!("color {raw:?} is not in #rrggbb form");
    }
    u32::from_str_radix(hex, 16).with_context(|| format!("color {raw:?} is not valid hex"))
}

/// A tier that kicks in below `trigger` minutes. A trigger of 0 disables it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierStyle {
    pub trigger: u64,
    #[serde(flatten)]
    pub colors: ColorPair,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierSettings {
    pub normal: ColorPair,
    pub warning: TierStyle,
    pub critical: TierStyle,
    pub imminent: TierStyle,
}

impl Default for TierSettings {
    fn default() -> Self {
        Self {
            normal: ColorPair::new("#0a1932", "#ffffff"),
            warning: TierStyle {
                trigger: 45,
                colors: ColorPair::new("#540000", "#ffffff"),
            },
            critical: TierStyle {
                trigger: 15,
                colors: ColorPair::new("#c1121f", "#ffffff"),
            },
            imminent: TierStyle {
                trigger: 5,
                colors: ColorPair::new("#ffa340", "#1f2633"),
            },
        }
    }
}

impl TierSettings {
    pub fn classify_minutes(&self, total_minutes: u64) -> UrgencyTier {
        let ordered = [
            (UrgencyTier::Imminent, &self.imminent),
            (UrgencyTier::Critical, &self.critical),
            (UrgencyTier::Warning, &self.warning),
        ];

        ordered
            .into_iter()
            .find(|(_, style)| total_minutes < style.trigger)
            .map(|(tier, _)| tier)
            .unwrap_or(UrgencyTier::Normal)
    }

    pub fn classify_remaining(&self, remaining: &Remaining) -> UrgencyTier {
        self.classify_minutes(remaining.total_minutes())
    }

    pub fn colors(&self, tier: UrgencyTier) -> &ColorPair {
        match tier {
            UrgencyTier::Normal => &self.normal,
            UrgencyTier::Warning => &self.warning.colors,
            UrgencyTier::Critical => &self.critical.colors,
            UrgencyTier::Imminent => &self.imminent.colors,
        }
    }

    pub fn colors_mut(&mut self, tier: UrgencyTier) -> &mut ColorPair {
        match tier {
            UrgencyTier::Normal => &mut self.normal,
            UrgencyTier::Warning => &mut self.warning.colors,
            UrgencyTier::Critical => &mut self.critical.colors,
            UrgencyTier::Imminent => &mut self.imminent.colors,
        }
    }

    /// Trigger in minutes; the normal tier has none.
    pub fn trigger(&self, tier: UrgencyTier) -> Option<u64> {
        match tier {
            UrgencyTier::Normal => None,
            UrgencyTier::Warning => Some(self.warning.trigger),
            UrgencyTier::Critical => Some(self.critical.trigger),
            UrgencyTier::Imminent => Some(self.imminent.trigger),
        }
    }

    /// Moves a trigger by `delta` minutes, stopping at 0. Ordering is left
    /// to `validate`.
    pub fn adjust_trigger(&mut self, tier: UrgencyTier, delta: i64) {
        let style = match tier {
            UrgencyTier::Normal => return,
            UrgencyTier::Warning => &mut self.warning,
            UrgencyTier::Critical => &mut self.critical,
            UrgencyTier::Imminent => &mut self.imminent,
        };
        style.trigger = style.trigger.saturating_add_signed(delta);
    }

    /// Rejects unparseable colors and enabled triggers that are not
    /// strictly increasing from imminent to warning.
    pub fn validate(&self) -> Result<()> {
        for tier in UrgencyTier::ALL {
            let colors = self.colors(tier);
            colors
                .background_rgb()
                .and_then(|_| colors.text_rgb())
                .with_context(|| format!("{} tier has an invalid color", tier.display_name()))?;
        }

        let enabled: Vec<(UrgencyTier, u64)> = [
            (UrgencyTier::Imminent, self.imminent.trigger),
            (UrgencyTier::Critical, self.critical.trigger),
            (UrgencyTier::Warning, self.warning.trigger),
        ]
        .into_iter()
        .filter(|(_, trigger)| *trigger > 0)
        .collect();

        for pair in enabled.windows(2) {
            let (lower, lower_trigger) = pair[0];
            let (upper, upper_trigger) = pair[1];
            if lower_trigger >= upper_trigger {
                bail!(
                    "{} trigger ({} min) must be below the {} trigger ({} min)",
                    lower.display_name(),
                    lower_trigger,
                    upper.display_name(),
                    upper_trigger
                );
            }
        }
        Ok(())
    }
}

/// Tier for a remaining duration given as hours and minutes.
pub fn classify(hours: u64, minutes: u64, thresholds: &TierSettings) -> UrgencyTier {
    thresholds.classify_minutes(hours * 60 + minutes)
}
