//! Parabolic SAR: Wilder's acceleration factor system.
//!
//! Inherently sequential/stateful: maintains direction, extreme point (EP),
//! and acceleration factor (AF). The AF starts at `acceleration`, grows by the
//! same step on every new extreme and is capped at `maximum`.
//!
//! The initial direction follows the first bar's directional movement: long
//! unless the low fell further than the high rose.
//! Lookback: 1 (needs at least 2 bars to start).

pub fn parabolic_sar(high: &[f64], low: &[f64], acceleration: f64, maximum: f64) -> Vec<f64> {
    let n = high.len().min(low.len());
    let mut result = vec![f64::NAN; n];

    if n < 2 || acceleration <= 0.0 {
        return result;
    }
    if high[0].is_nan() || low[0].is_nan() || high[1].is_nan() || low[1].is_nan() {
        return result;
    }

    let plus_dm = high[1] - high[0];
    let minus_dm = low[0] - low[1];
    let mut is_long = !(minus_dm > plus_dm && minus_dm > 0.0);
    let mut af = acceleration;
    let (mut sar, mut ep) = if is_long {
        (low[0], high[1])
    } else {
        (high[0], low[1])
    };

    result[1] = sar;

    for i in 2..n {
        if high[i].is_nan() || low[i].is_nan() {
            continue;
        }

        let mut new_sar = sar + af * (ep - sar);

        if is_long {
            // SAR must not be above the two previous lows
            for prev in [low[i - 1], low[i - 2]] {
                if !prev.is_nan() {
                    new_sar = new_sar.min(prev);
                }
            }
            if low[i] < new_sar {
                is_long = false;
                new_sar = ep;
                ep = low[i];
                af = acceleration;
            } else if high[i] > ep {
                ep = high[i];
                af = (af + acceleration).min(maximum);
            }
        } else {
            // SAR must not be below the two previous highs
            for prev in [high[i - 1], high[i - 2]] {
                if !prev.is_nan() {
                    new_sar = new_sar.max(prev);
                }
            }
            if high[i] > new_sar {
                is_long = true;
                new_sar = ep;
                ep = high[i];
                af = acceleration;
            } else if low[i] < ep {
                ep = low[i];
                af = (af + acceleration).min(maximum);
            }
        }

        sar = new_sar;
        result[i] = sar;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(data: &[(f64, f64, f64, f64)]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        (
            data.iter().map(|d| d.1).collect(),
            data.iter().map(|d| d.2).collect(),
            data.iter().map(|d| d.3).collect(),
        )
    }

    #[test]
    fn psar_uptrend_below_price() {
        let data: Vec<_> = (0..10)
            .map(|i| {
                let base = 100.0 + i as f64 * 3.0;
                (base, base + 2.0, base - 1.0, base + 1.5)
            })
            .collect();
        let (h, l, _) = split(&data);
        let result = parabolic_sar(&h, &l, 0.02, 0.2);
        for i in 2..10 {
            assert!(result[i] < l[i], "PSAR {} not below low {} at {i}", result[i], l[i]);
        }
    }

    #[test]
    fn psar_downtrend_above_price() {
        let data: Vec<_> = (0..10)
            .map(|i| {
                let base = 200.0 - i as f64 * 3.0;
                (base, base + 1.0, base - 2.0, base - 1.5)
            })
            .collect();
        let (h, l, _) = split(&data);
        let result = parabolic_sar(&h, &l, 0.02, 0.2);
        assert!((2..10).any(|i| result[i] > h[i]));
    }

    #[test]
    fn psar_reversal_occurs() {
        let (h, l, c) = split(&[
            (100.0, 105.0, 98.0, 103.0),
            (103.0, 108.0, 101.0, 107.0),
            (107.0, 112.0, 105.0, 111.0),
            (111.0, 115.0, 109.0, 114.0),
            (114.0, 114.5, 100.0, 101.0),
            (101.0, 102.0, 95.0, 96.0),
            (96.0, 97.0, 90.0, 91.0),
        ]);
        let result = parabolic_sar(&h, &l, 0.02, 0.2);
        let mut below = false;
        let mut flipped = false;
        for i in 1..7 {
            if result[i] < c[i] {
                below = true;
            }
            if below && result[i] > c[i] {
                flipped = true;
            }
        }
        assert!(flipped, "PSAR should flip direction after reversal");
    }

    #[test]
    fn psar_too_few_bars() {
        assert!(parabolic_sar(&[105.0], &[95.0], 0.02, 0.2)[0].is_nan());
    }
}
