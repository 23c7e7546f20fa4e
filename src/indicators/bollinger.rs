// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), where σ is the population standard deviation
// over the same window.
//
// The 5-minute calculator reports BB(21, 2) as a diagnostic.

use super::{sma, stddev};

/// Aligned Bollinger band series.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub mid: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

impl BollingerBands {
    /// `(upper, mid, lower)` at the final position, if all three are defined.
    pub fn latest(&self) -> Option<(f64, f64, f64)> {
        let upper = self.upper.last().copied().flatten()?;
        let mid = self.mid.last().copied().flatten()?;
        let lower = self.lower.last().copied().flatten()?;
        Some((upper, mid, lower))
    }
}

/// Calculate Bollinger Bands for the given closing prices.
///
/// - `mid`   = SMA(close, period)
/// - `upper` = mid + `multiplier` * σ
/// - `lower` = mid - `multiplier` * σ
///
/// Upper and lower are `None` wherever either the SMA or σ is undefined.
pub fn bollinger(close: &[f64], period: usize, multiplier: f64, warmup: usize) -> BollingerBands {
    let mid = sma(close, period, warmup);
    let dev = stddev(close, period, warmup);

    let (upper, lower) = mid
        .iter()
        .zip(dev.iter())
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => (Some(m + multiplier * s), Some(m - multiplier * s)),
            _ => (None, None),
        })
        .unzip();

    BollingerBands { mid, upper, lower }
}
