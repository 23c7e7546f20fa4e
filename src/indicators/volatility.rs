// =============================================================================
// Historical Volatility: log-return σ over several lookbacks
// =============================================================================
//
// For a lookback L the volatility is the sample standard deviation (n - 1)
// of log(close_i / close_{i-1}) over the trailing L + 1 closes.
//
// Several lookbacks are combined into one figure by averaging three means of
// the per-lookback volatilities:
//
//   avg = (arithmetic + geometric + harmonic) / 3
//
// Geometric and harmonic means collapse to 0 when any input volatility is
// (near) zero.

use serde::{Deserialize, Serialize};

use super::FUZZY_ZERO;

/// Aggregated volatility across a set of lookbacks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// Sample standard deviation; 0 for fewer than two values.
fn sample_stddev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let ssd: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    let variance = ssd / (n - 1) as f64;
    if variance > 0.0 {
        variance.sqrt()
    } else {
        0.0
    }
}

/// Log-return volatility of a closing-price window.
///
/// Returns `None` if any price is non-positive (≤ machine epsilon) or
/// non-finite, since the log return is undefined there.
fn log_return_volatility(closes: &[f64]) -> Option<f64> {
    if closes.len() < 2 {
        return Some(0.0);
    }
    let mut returns = Vec::with_capacity(closes.len() - 1);
    for pair in closes.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        if !(prev > f64::EPSILON && curr > f64::EPSILON) || !prev.is_finite() || !curr.is_finite() {
            return None;
        }
        returns.push((curr / prev).ln());
    }
    let sd = sample_stddev(&returns);
    sd.is_finite().then_some(sd)
}

/// Volatility of the trailing `lookback + 1` closes.
///
/// `None` when `lookback` is zero, fewer than `lookback + 1` closes are
/// available, or a price in the window is non-positive.
pub fn historical_volatility(closes: &[f64], lookback: usize) -> Option<f64> {
    if lookback == 0 || closes.len() < lookback + 1 {
        return None;
    }
    log_return_volatility(&closes[closes.len() - (lookback + 1)..])
}

/// Combine per-lookback volatilities into avg/min/max.
///
/// Negative inputs are clamped to 0.  Returns `None` for an empty slice.
pub fn combine_volatilities(vols: &[f64]) -> Option<VolatilityStats> {
    if vols.is_empty() {
        return None;
    }
    let vols: Vec<f64> = vols.iter().map(|v| v.max(0.0)).collect();
    let n = vols.len() as f64;

    let arithmetic = vols.iter().sum::<f64>() / n;
    let has_zero = vols.iter().any(|v| v.abs() <= FUZZY_ZERO);

    let geometric = if has_zero {
        0.0
    } else {
        vols.iter().product::<f64>().powf(1.0 / n)
    };

    let harmonic = if has_zero {
        0.0
    } else {
        let inv_sum: f64 = vols.iter().map(|v| 1.0 / v).sum();
        if inv_sum.abs() <= FUZZY_ZERO {
            0.0
        } else {
            n / inv_sum
        }
    };

    let min = vols.iter().copied().fold(f64::INFINITY, f64::min);
    let max = vols.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(VolatilityStats {
        avg: (arithmetic + geometric + harmonic) / 3.0,
        min,
        max,
    })
}
