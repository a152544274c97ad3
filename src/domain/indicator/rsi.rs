//! RSI (Relative Strength Index) indicator.
//!
//! Price changes are taken over `drift` rows. Average gain and loss use
//! Wilder's moving average in its exponentially weighted form with
//! alpha = 1/n, weighting every change seen so far:
//!
//!   avg[t] = sum((1-alpha)^j * x[t-j]) / sum((1-alpha)^j)
//!
//! Formula: RSI = scalar * avg_gain / (avg_gain + avg_loss)
//! The shared denominator cancels, so only the weighted sums are tracked.
//! If both sums are zero (flat prices) the row is undefined.
//!
//! Warmup: a row is defined once n price changes have been seen, so with
//! drift = 1 the first n rows are undefined.

pub fn calculate_rsi(
    close: &[Option<f64>],
    period: usize,
    scalar: f64,
    drift: usize,
) -> Vec<Option<f64>> {
    if period == 0 || drift == 0 {
        return vec![None; close.len()];
    }

    let decay = 1.0 - 1.0 / period as f64;
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    let mut observations = 0usize;
    let mut values = Vec::with_capacity(close.len());

    for i in 0..close.len() {
        let change = match (close.get(i).copied().flatten(), i.checked_sub(drift)) {
            (Some(curr), Some(prev_idx)) => close[prev_idx].map(|prev| curr - prev),
            _ => None,
        };

        match change {
            Some(change) => {
                gain_sum = change.max(0.0) + decay * gain_sum;
                loss_sum = (-change).max(0.0) + decay * loss_sum;
                observations += 1;
            }
            None if observations > 0 => {
                gain_sum *= decay;
                loss_sum *= decay;
            }
            None => {}
        }

        let total = gain_sum + loss_sum;
        if observations >= period && total > 0.0 {
            values.push(Some(scalar * gain_sum / total));
        } else {
            values.push(None);
        }
    }

    values
}
