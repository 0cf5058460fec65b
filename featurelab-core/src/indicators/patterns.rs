//! Candlestick pattern recognition.
//!
//! Each function scores every bar with `100` (bullish), `-100` (bearish) or `0`.
//! Bars with a zero or undefined range never match.

#[derive(Debug, Clone, Copy)]
struct Candle {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

impl Candle {
    fn range(&self) -> f64 {
        self.high - self.low
    }

    fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    fn upper_shadow(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    fn lower_shadow(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    fn bullish(&self) -> bool {
        self.close > self.open
    }

    fn bearish(&self) -> bool {
        self.close < self.open
    }

    fn valid(&self) -> bool {
        let range = self.range();
        range.is_finite() && range > 0.0 && self.open.is_finite() && self.close.is_finite()
    }
}

fn candles<'a>(
    open: &'a [f64],
    high: &'a [f64],
    low: &'a [f64],
    close: &'a [f64],
) -> impl Iterator<Item = Candle> + 'a {
    let n = open.len().min(high.len()).min(low.len()).min(close.len());
    (0..n).map(move |i| Candle {
        open: open[i],
        high: high[i],
        low: low[i],
        close: close[i],
    })
}

fn score_single(
    open: &[f64],
    high: &[f64],
    low: &[f64],
    close: &[f64],
    rule: impl Fn(&Candle) -> f64,
) -> Vec<f64> {
    candles(open, high, low, close)
        .map(|c| if c.valid() { rule(&c) } else { 0.0 })
        .collect()
}

fn score_pair(
    open: &[f64],
    high: &[f64],
    low: &[f64],
    close: &[f64],
    rule: impl Fn(&Candle, &Candle) -> f64,
) -> Vec<f64> {
    let bars: Vec<Candle> = candles(open, high, low, close).collect();
    let mut out = vec![0.0; bars.len()];
    for i in 1..bars.len() {
        let (prev, cur) = (&bars[i - 1], &bars[i]);
        if prev.valid() && cur.valid() {
            out[i] = rule(prev, cur);
        }
    }
    out
}

/// Body no larger than a tenth of the range.
pub fn doji(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    score_single(open, high, low, close, |c| {
        if c.body() <= 0.1 * c.range() {
            100.0
        } else {
            0.0
        }
    })
}

/// Small body near the top with a lower shadow at least twice the body.
pub fn hammer(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    score_single(open, high, low, close, |c| {
        let body = c.body();
        if body > 0.0 && c.lower_shadow() >= 2.0 * body && c.upper_shadow() <= 0.1 * c.range() {
            100.0
        } else {
            0.0
        }
    })
}

/// Mirror of the hammer: long upper shadow, body near the low.
pub fn shooting_star(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    score_single(open, high, low, close, |c| {
        let body = c.body();
        if body > 0.0 && c.upper_shadow() >= 2.0 * body && c.lower_shadow() <= 0.1 * c.range() {
            -100.0
        } else {
            0.0
        }
    })
}

/// Body covering at least 95% of the range.
pub fn marubozu(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    score_single(open, high, low, close, |c| {
        if c.body() < 0.95 * c.range() {
            0.0
        } else if c.bullish() {
            100.0
        } else if c.bearish() {
            -100.0
        } else {
            0.0
        }
    })
}

/// Current body engulfs the previous, opposite-colored body.
pub fn engulfing(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    score_pair(open, high, low, close, |prev, cur| {
        if prev.bearish() && cur.bullish() && cur.open <= prev.close && cur.close >= prev.open {
            100.0
        } else if prev.bullish() && cur.bearish() && cur.open >= prev.close && cur.close <= prev.open {
            -100.0
        } else {
            0.0
        }
    })
}

/// Current opposite-colored body lies strictly inside the previous body.
pub fn harami(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    score_pair(open, high, low, close, |prev, cur| {
        let prev_top = prev.open.max(prev.close);
        let prev_bottom = prev.open.min(prev.close);
        let inside = cur.open.max(cur.close) < prev_top && cur.open.min(cur.close) > prev_bottom;
        if !inside {
            0.0
        } else if prev.bearish() && cur.bullish() {
            100.0
        } else if prev.bullish() && cur.bearish() {
            -100.0
        } else {
            0.0
        }
    })
}
