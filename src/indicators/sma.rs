// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
//   SMA_t = (x_{t-period+1} + ... + x_t) / period
//
// A position is only defined when all `period` samples in its trailing
// window are finite.  A missing sample therefore blanks every window that
// still contains it.

use super::{apply_warmup, finite};

/// Rolling arithmetic mean over a trailing window of exactly `period`
/// finite samples.
pub fn sma(values: &[f64], period: usize, warmup: usize) -> Vec<Option<f64>> {
    let samples: Vec<Option<f64>> = values.iter().map(|&v| finite(v)).collect();
    rolling_mean(&samples, period, warmup)
}

/// SMA over an already-aligned optional series (used to smooth other
/// indicators, e.g. the stochastic %K).
pub(crate) fn rolling_mean(samples: &[Option<f64>], period: usize, warmup: usize) -> Vec<Option<f64>> {
    let n = samples.len();
    let mut out = vec![None; n];
    if period == 0 || n == 0 {
        return out;
    }

    let sample = |i: usize| samples[i].filter(|x| x.is_finite());

    let mut sum = 0.0_f64;
    let mut count = 0_usize;
    for i in 0..n {
        if let Some(x) = sample(i) {
            sum += x;
            count += 1;
        }
        if i >= period {
            if let Some(old) = sample(i - period) {
                sum -= old;
                count -= 1;
            }
        }
        if i + 1 >= period && count == period {
            out[i] = Some(sum / period as f64);
        }
    }

    apply_warmup(&mut out, warmup);
    out
}
