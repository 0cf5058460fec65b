//! Pivot-point levels over a rolling window.
//!
//! Five systems are computed from the window's high/low and the previous bar's
//! open/close: standard, Fibonacci, Camarilla, Woodie and Demark. Each level
//! column gets a companion `distance_to_<level> = close - level`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::series::{rolling_max, rolling_min, shift};
use crate::domain::FeatureFrame;

const FIBONACCI_RATIOS: [f64; 8] = [0.236, 0.382, 0.5, 0.618, 0.786, 1.0, 1.272, 1.618];
const CAMARILLA_MAX_LEVELS: usize = 4;

/// Pivot stage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotConfig {
    /// Candles in the rolling high/low window.
    pub window: usize,
    /// Support/resistance levels per system; zero disables the stage.
    pub levels: usize,
    /// Drop the raw levels and keep only the distance columns.
    pub distances_only: bool,
}

impl Default for PivotConfig {
    fn default() -> Self {
        Self {
            window: 14,
            levels: 5,
            distances_only: true,
        }
    }
}

/// Add pivot levels (and distances to them) to `frame`.
///
/// A frame missing any of open/high/low/close is returned unchanged.
pub fn add_pivot_levels(mut frame: FeatureFrame, config: &PivotConfig) -> FeatureFrame {
    let (Some(open), Some(high), Some(low), Some(close)) = (
        frame.column("open"),
        frame.column("high"),
        frame.column("low"),
        frame.column("close"),
    ) else {
        return frame;
    };

    let hh = rolling_max(high, config.window);
    let ll = rolling_min(low, config.window);
    let prev_close = shift(close, 1);
    let prev_open = shift(open, 1);
    let close = close.to_vec();
    let range: Vec<f64> = hh.iter().zip(&ll).map(|(h, l)| h - l).collect();

    let mut levels = Levels::default();

    // Standard
    let p: Vec<f64> = (0..frame.len())
        .map(|i| (hh[i] + ll[i] + prev_close[i]) / 3.0)
        .collect();
    levels.push("standard_P", p.clone());
    for j in 1..=config.levels {
        levels.push_band("standard", j, &p, &range, j as f64);
    }

    // Fibonacci
    for (j, ratio) in FIBONACCI_RATIOS.iter().enumerate().take(config.levels) {
        levels.push_band("fibonacci", j + 1, &p, &range, *ratio);
    }

    // Camarilla
    for j in 1..=config.levels.min(CAMARILLA_MAX_LEVELS) {
        let factor = 1.1 / (12.0 / j as f64);
        levels.push_band("camarilla", j, &prev_close, &range, factor);
    }

    // Woodie
    let wp: Vec<f64> = (0..frame.len())
        .map(|i| (hh[i] + ll[i] + 2.0 * prev_open[i]) / 4.0)
        .collect();
    levels.push("woodie_P", wp.clone());
    for j in 1..=config.levels {
        levels.push_band("woodie", j, &wp, &range, j as f64);
    }

    // Demark defines a single level pair
    let x: Vec<f64> = (0..frame.len())
        .map(|i| {
            let (h, l, c, o) = (hh[i], ll[i], prev_close[i], prev_open[i]);
            if c < o {
                h + 2.0 * l + c
            } else if c > o {
                2.0 * h + l + c
            } else {
                h + l + 2.0 * c
            }
        })
        .collect();
    levels.push("demark_P", x.iter().map(|x| x / 4.0).collect());
    levels.push("demark_R1", x.iter().zip(&ll).map(|(x, l)| x / 2.0 - l).collect());
    levels.push("demark_S1", x.iter().zip(&hh).map(|(x, h)| x / 2.0 - h).collect());

    let count = levels.0.len();
    let mut distances = Vec::with_capacity(count);
    for (name, values) in &levels.0 {
        let distance = close.iter().zip(values).map(|(c, v)| c - v).collect();
        distances.push((format!("distance_to_{name}"), distance));
    }

    if !config.distances_only {
        for (name, values) in levels.0 {
            frame.insert(name, values);
        }
    }
    for (name, values) in distances {
        frame.insert(name, values);
    }

    debug!(window = config.window, levels = count, "pivot levels added");
    frame
}

#[derive(Default)]
struct Levels(Vec<(String, Vec<f64>)>);

impl Levels {
    fn push(&mut self, name: &str, values: Vec<f64>) {
        self.0.push((name.to_string(), values));
    }

    /// `R_j = base + factor * range` and `S_j = base - factor * range`.
    fn push_band(&mut self, system: &str, j: usize, base: &[f64], range: &[f64], factor: f64) {
        let r = base.iter().zip(range).map(|(b, r)| b + factor * r).collect();
        let s = base.iter().zip(range).map(|(b, r)| b - factor * r).collect();
        self.0.push((format!("{system}_R{j}"), r));
        self.0.push((format!("{system}_S{j}"), s));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::test_support::t0;
    use crate::domain::series::assert_approx;
    use chrono::Duration;

    fn flat_frame(n: usize) -> FeatureFrame {
        let mut frame = FeatureFrame::new((0..n).map(|h| t0() + Duration::hours(h as i64)).collect());
        frame.insert("open", vec![100.0; n]);
        frame.insert("high", vec![110.0; n]);
        frame.insert("low", vec![90.0; n]);
        frame.insert("close", vec![100.0; n]);
        frame.insert("volume", vec![1.0; n]);
        frame
    }

    fn keep_levels(levels: usize) -> PivotConfig {
        PivotConfig {
            levels,
            distances_only: false,
            ..PivotConfig::default()
        }
    }

    #[test]
    fn standard_levels_on_flat_series() {
        let out = add_pivot_levels(flat_frame(20), &keep_levels(5));
        let p = out.column("standard_P").unwrap();
        let r1 = out.column("standard_R1").unwrap();
        let s2 = out.column("standard_S2").unwrap();
        assert!(p[12].is_nan());
        assert_approx(p[19], 100.0, 1e-12);
        assert_approx(r1[19], 120.0, 1e-12);
        assert_approx(s2[19], 60.0, 1e-12);
        assert_approx(out.column("distance_to_standard_R1").unwrap()[19], -20.0, 1e-12);
    }

    #[test]
    fn distances_only_drops_raw_levels() {
        let out = add_pivot_levels(flat_frame(20), &PivotConfig::default());
        assert!(!out.has_column("standard_P"));
        assert!(!out.has_column("standard_R1"));
        assert!(out.has_column("distance_to_standard_P"));
        assert!(out.has_column("distance_to_standard_R1"));
        assert!(out.has_column("distance_to_demark_S1"));
        assert!(out.columns().all(|(name, _)| !name.starts_with("woodie")));
    }

    #[test]
    fn level_counts_per_system() {
        let out = add_pivot_levels(flat_frame(20), &keep_levels(6));
        assert!(out.has_column("standard_R6"));
        assert!(out.has_column("fibonacci_S6"));
        assert!(!out.has_column("fibonacci_R7"));
        assert!(out.has_column("camarilla_R4"));
        assert!(!out.has_column("camarilla_R5"));
        assert!(out.has_column("demark_R1"));
        assert!(!out.has_column("demark_R2"));
    }

    #[test]
    fn camarilla_and_woodie_values() {
        let out = add_pivot_levels(flat_frame(20), &keep_levels(4));
        // range 20, factor 1.1/12*4
        assert_approx(out.column("camarilla_R4").unwrap()[19], 100.0 + 20.0 * 1.1 / 3.0, 1e-9);
        assert_approx(out.column("woodie_P").unwrap()[19], 100.0, 1e-12);
        assert_approx(out.column("woodie_S1").unwrap()[19], 80.0, 1e-12);
    }

    #[test]
    fn demark_branches_on_previous_bar() {
        let mut frame = flat_frame(20);
        let mut close = vec![100.0; 20];
        close[18] = 95.0; // previous close below previous open at row 19
        frame.insert("close", close);
        let out = add_pivot_levels(frame, &keep_levels(1));
        // X = H + 2L + C = 110 + 180 + 95
        assert_approx(out.column("demark_P").unwrap()[19], 385.0 / 4.0, 1e-12);
        assert_approx(out.column("demark_R1").unwrap()[19], 385.0 / 2.0 - 90.0, 1e-12);
        assert_approx(out.column("demark_S1").unwrap()[19], 385.0 / 2.0 - 110.0, 1e-12);
    }

    #[test]
    fn demark_previous_close_above_open() {
        let mut frame = flat_frame(20);
        let mut close = vec![100.0; 20];
        close[18] = 104.0;
        frame.insert("close", close);
        let out = add_pivot_levels(frame, &keep_levels(1));
        // X = 2H + L + C = 220 + 90 + 104
        assert_approx(out.column("demark_P").unwrap()[19], 414.0 / 4.0, 1e-12);
        assert_approx(out.column("demark_R1").unwrap()[19], 414.0 / 2.0 - 90.0, 1e-12);
        assert_approx(out.column("demark_S1").unwrap()[19], 414.0 / 2.0 - 110.0, 1e-12);
        // row 18 sees an unchanged previous bar: X = H + L + 2C = 400
        assert_approx(out.column("demark_P").unwrap()[18], 100.0, 1e-12);
    }
}
