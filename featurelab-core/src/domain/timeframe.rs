//! Bar timeframes and the uniform time grid they induce.

use chrono::{Duration, Months, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

/// Returned when a timeframe label is not one of [`Timeframe::supported`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("timeframe not supported: '{0}'")]
pub struct UnknownTimeframe(pub String);

/// Supported bar intervals, ordered from shortest to longest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Timeframe {
    M1,
    M2,
    M3,
    M4,
    M5,
    M10,
    M12,
    M15,
    M20,
    M30,
    H1,
    H2,
    H3,
    H4,
    H6,
    H8,
    H12,
    D1,
    W1,
    Mn1,
}

const ALL: [Timeframe; 20] = [
    Timeframe::M1,
    Timeframe::M2,
    Timeframe::M3,
    Timeframe::M4,
    Timeframe::M5,
    Timeframe::M10,
    Timeframe::M12,
    Timeframe::M15,
    Timeframe::M20,
    Timeframe::M30,
    Timeframe::H1,
    Timeframe::H2,
    Timeframe::H3,
    Timeframe::H4,
    Timeframe::H6,
    Timeframe::H8,
    Timeframe::H12,
    Timeframe::D1,
    Timeframe::W1,
    Timeframe::Mn1,
];

impl Timeframe {
    /// All supported timeframes, shortest first.
    pub fn supported() -> &'static [Timeframe] {
        &ALL
    }

    /// Request label, e.g. `"15min"`, `"4h"`, `"1m"` (one month).
    pub fn label(self) -> &'static str {
        match self {
            Timeframe::M1 => "1min",
            Timeframe::M2 => "2min",
            Timeframe::M3 => "3min",
            Timeframe::M4 => "4min",
            Timeframe::M5 => "5min",
            Timeframe::M10 => "10min",
            Timeframe::M12 => "12min",
            Timeframe::M15 => "15min",
            Timeframe::M20 => "20min",
            Timeframe::M30 => "30min",
            Timeframe::H1 => "1h",
            Timeframe::H2 => "2h",
            Timeframe::H3 => "3h",
            Timeframe::H4 => "4h",
            Timeframe::H6 => "6h",
            Timeframe::H8 => "8h",
            Timeframe::H12 => "12h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1w",
            Timeframe::Mn1 => "1m",
        }
    }

    pub fn description(self) -> String {
        match self {
            Timeframe::W1 => "1 week".to_string(),
            Timeframe::Mn1 => "1 month".to_string(),
            Timeframe::D1 => "1 day".to_string(),
            tf => {
                let minutes = tf.fixed_minutes().unwrap_or_default();
                if minutes < 60 {
                    format!("{minutes} minute{}", if minutes == 1 { "" } else { "s" })
                } else {
                    let hours = minutes / 60;
                    format!("{hours} hour{}", if hours == 1 { "" } else { "s" })
                }
            }
        }
    }

    /// Interval length in minutes; `None` for calendar months.
    fn fixed_minutes(self) -> Option<i64> {
        let minutes = match self {
            Timeframe::M1 => 1,
            Timeframe::M2 => 2,
            Timeframe::M3 => 3,
            Timeframe::M4 => 4,
            Timeframe::M5 => 5,
            Timeframe::M10 => 10,
            Timeframe::M12 => 12,
            Timeframe::M15 => 15,
            Timeframe::M20 => 20,
            Timeframe::M30 => 30,
            Timeframe::H1 => 60,
            Timeframe::H2 => 120,
            Timeframe::H3 => 180,
            Timeframe::H4 => 240,
            Timeframe::H6 => 360,
            Timeframe::H8 => 480,
            Timeframe::H12 => 720,
            Timeframe::D1 => 1_440,
            Timeframe::W1 => 10_080,
            Timeframe::Mn1 => return None,
        };
        Some(minutes)
    }

    /// True for timeframes shorter than one hour (minute column is meaningful).
    pub fn is_sub_hour(self) -> bool {
        self < Timeframe::H1
    }

    /// True for timeframes shorter than one day (hour column is meaningful).
    pub fn is_sub_day(self) -> bool {
        self < Timeframe::D1
    }

    /// The grid point following `t`.
    pub fn advance(self, t: NaiveDateTime) -> Option<NaiveDateTime> {
        match self.fixed_minutes() {
            Some(minutes) => t.checked_add_signed(Duration::minutes(minutes)),
            None => t.checked_add_months(Months::new(1)),
        }
    }

    /// Uniform grid from `start` to `end` inclusive, stepping by this timeframe.
    ///
    /// Empty when `end < start`.
    pub fn grid(self, start: NaiveDateTime, end: NaiveDateTime) -> Vec<NaiveDateTime> {
        let mut grid = Vec::new();
        let mut t = start;
        while t <= end {
            grid.push(t);
            match self.advance(t) {
                Some(next) => t = next,
                None => break,
            }
        }
        grid
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Timeframe {
    type Err = UnknownTimeframe;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL.iter()
            .copied()
            .find(|tf| tf.label() == s)
            .ok_or_else(|| UnknownTimeframe(s.to_string()))
    }
}
