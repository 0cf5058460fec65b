//! Price transforms.

pub fn avg_price(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    (0..open.len().min(high.len()).min(low.len()).min(close.len()))
        .map(|i| (open[i] + high[i] + low[i] + close[i]) / 4.0)
        .collect()
}

pub fn med_price(high: &[f64], low: &[f64]) -> Vec<f64> {
    high.iter().zip(low).map(|(h, l)| (h + l) / 2.0).collect()
}

pub fn typ_price(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    (0..high.len().min(low.len()).min(close.len()))
        .map(|i| (high[i] + low[i] + close[i]) / 3.0)
        .collect()
}
