// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator primitives over price sequences.  Series
// functions return one `Option<f64>` per input sample so results stay
// positionally aligned with the candles they were computed from; `None`
// marks a position that is not computable (warm-up, missing input, or a
// degenerate window).  Non-finite inputs are treated as missing samples.

pub mod bollinger;
pub mod ema;
pub mod pivots;
pub mod sma;
pub mod stddev;
pub mod stochastic;
pub mod volatility;
pub mod vwap;

pub use bollinger::{bollinger, BollingerBands};
pub use ema::{ema, latest_ema};
pub use pivots::{pivots_camarilla, pivots_classic, pivots_fibonacci, PivotLevels, PivotSet};
pub use sma::sma;
pub use stddev::stddev;
pub use stochastic::{stochastics, Stochastic};
pub use volatility::{combine_volatilities, historical_volatility, VolatilityStats};
pub use vwap::vwap;

/// Magnitudes at or below this are treated as zero (flat ranges, vanishing
/// volatilities).
pub(crate) const FUZZY_ZERO: f64 = 1e-12;

/// `Some(x)` for finite samples, `None` otherwise.
#[inline]
pub(crate) fn finite(x: f64) -> Option<f64> {
    if x.is_finite() {
        Some(x)
    } else {
        None
    }
}

/// Force every position before index `warmup - 1` to `None`.
pub(crate) fn apply_warmup(out: &mut [Option<f64>], warmup: usize) {
    let cutoff = warmup.saturating_sub(1).min(out.len());
    for slot in &mut out[..cutoff] {
        *slot = None;
    }
}

/// Last element of an aligned series, flattened.
pub fn last_value(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}
