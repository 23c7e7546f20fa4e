// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = close_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The very first EMA value is seeded with the SMA of the first `period`
// finite closes.
// =============================================================================

use super::apply_warmup;

/// Compute the EMA series for `values`, aligned one-to-one with the input.
///
/// # Edge cases
/// - `period == 0` or empty input => every position `None`.
/// - Positions before the seed window fills are `None`.
/// - A non-finite input yields `None` at that position; the recurrence state
///   is left untouched so the next finite value continues from the last
///   valid EMA (or keeps filling the seed window).
pub fn ema(values: &[f64], period: usize, warmup: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut out = vec![None; n];
    if period == 0 || n == 0 {
        return out;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut prev: Option<f64> = None;
    let mut seed_sum = 0.0_f64;
    let mut seed_count = 0_usize;

    for (i, &x) in values.iter().enumerate() {
        if !x.is_finite() {
            continue;
        }
        match prev {
            Some(p) => {
                let next = x * multiplier + p * (1.0 - multiplier);
                prev = Some(next);
                out[i] = Some(next);
            }
            None => {
                seed_sum += x;
                seed_count += 1;
                if seed_count >= period {
                    let seed = seed_sum / period as f64;
                    prev = Some(seed);
                    out[i] = Some(seed);
                }
            }
        }
    }

    apply_warmup(&mut out, warmup);
    out
}

/// Final EMA value of a closing-price series, seeded with the SMA of the
/// first `period` closes.
///
/// Returns `None` when the input is shorter than `period`, `period` is zero,
/// or the recurrence produces a non-finite or zero result (the analytics
/// calculators treat a zero EMA as "not calculated").
pub fn latest_ema(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let seed: f64 = closes[..period].iter().sum::<f64>() / period as f64;

    let value = closes[period..]
        .iter()
        .fold(seed, |prev, &close| close * multiplier + prev * (1.0 - multiplier));

    if value.is_finite() && value != 0.0 {
        Some(value)
    } else {
        None
    }
}
