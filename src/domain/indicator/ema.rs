//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) rows are undefined. An undefined close yields an
//! undefined row and leaves the running average untouched.

pub fn calculate_ema(close: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; close.len()];
    }

    let mut values = Vec::with_capacity(close.len());
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema: Option<f64> = None;
    let mut seed: Vec<f64> = Vec::with_capacity(period);

    for price in close {
        let Some(price) = *price else {
            values.push(None);
            continue;
        };

        match ema {
            Some(prev) => {
                let next = price * k + prev * (1.0 - k);
                ema = Some(next);
                values.push(Some(next));
            }
            None => {
                seed.push(price);
                if seed.len() == period {
                    let sma = seed.iter().sum::<f64>() / period as f64;
                    ema = Some(sma);
                    values.push(Some(sma));
                } else {
                    values.push(None);
                }
            }
        }
    }

    values
}
