//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = sum(C[i-n+1..=i]) / n
//! Warmup: first (n-1) rows are undefined. A window touching an undefined
//! close is undefined as well.

pub fn calculate_sma(close: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; close.len()];
    }

    (0..close.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &close[i + 1 - period..=i];
            window
                .iter()
                .copied()
                .sum::<Option<f64>>()
                .map(|sum| sum / period as f64)
        })
        .collect()
}
