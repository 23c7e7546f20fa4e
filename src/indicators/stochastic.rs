// =============================================================================
// Stochastic Oscillator (slow)
// =============================================================================
//
//   fast %K_t = 100 * (C_t - LL) / (HH - LL)     over the trailing k_period bars
//                                                (fewer at the start of the series)
//   slow %K   = SMA(fast %K, k_smoothing)
//   %D        = SMA(slow %K, d_period)
//
// A window with a (near) zero or non-finite high-low range has no fast %K.

use super::sma::rolling_mean;
use super::FUZZY_ZERO;

/// Aligned stochastic series.
#[derive(Debug, Clone, PartialEq)]
pub struct Stochastic {
    /// Slow %K.
    pub k: Vec<Option<f64>>,
    /// Slow %D.
    pub d: Vec<Option<f64>>,
    /// Fast %K, before smoothing.  Not warm-up gated.
    pub fast_k: Vec<Option<f64>>,
}

impl Stochastic {
    /// `(%K, %D)` at the final position.
    pub fn latest(&self) -> Option<(f64, f64)> {
        let k = self.k.last().copied().flatten()?;
        let d = self.d.last().copied().flatten()?;
        Some((k, d))
    }
}

pub fn stochastics(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    k_period: usize,
    k_smoothing: usize,
    d_period: usize,
    warmup: usize,
) -> Stochastic {
    let n = close.len();
    let mut fast_k = vec![None; n];

    if n > 0 && k_period > 0 {
        for i in 0..n {
            // Leading bars use the partial window available so far.
            let start = (i + 1).saturating_sub(k_period);
            let mut hh = f64::NEG_INFINITY;
            let mut ll = f64::INFINITY;
            let mut complete = true;
            for j in start..=i {
                match (high.get(j), low.get(j)) {
                    (Some(&h), Some(&l)) if h.is_finite() && l.is_finite() => {
                        hh = hh.max(h);
                        ll = ll.min(l);
                    }
                    _ => {
                        complete = false;
                        break;
                    }
                }
            }
            if !complete {
                continue;
            }

            let range = hh - ll;
            let c = close[i];
            if !range.is_finite() || range.abs() <= FUZZY_ZERO || !c.is_finite() {
                continue;
            }
            fast_k[i] = Some(100.0 * (c - ll) / range);
        }
    }

    // Both smoothing passes carry the warm-up floor; %D sees the gated %K.
    let k = rolling_mean(&fast_k, k_smoothing, warmup);
    let d = rolling_mean(&k, d_period, warmup);

    Stochastic { k, d, fast_k }
}
