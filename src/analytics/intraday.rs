// =============================================================================
// 5-Minute Analytics
// =============================================================================
//
// EMA(21) of the 5-minute closes is the only persisted metric.  Bollinger
// (21, 2) and Stochastic (14, 3, 3) are computed alongside it and kept as
// diagnostics.

use serde::Serialize;

use super::{warmup_for, EMA_PERIOD};
use crate::indicators::{bollinger, ema, last_value, latest_ema, stochastics};
use crate::market_data::Candle;

const BB_PERIOD: usize = 21;
const BB_MULTIPLIER: f64 = 2.0;
const STOCH_K: usize = 14;
const STOCH_SMOOTH: usize = 3;
const STOCH_D: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandLevels {
    pub upper: f64,
    pub mid: f64,
    pub lower: f64,
}

/// Last slow %K, and %D when the warm-up leaves enough %K values to smooth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StochasticLevels {
    pub k: f64,
    pub d: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntradayDiagnostics {
    pub ema21_tail: Option<f64>,
    pub bollinger: Option<BandLevels>,
    pub stochastic: Option<StochasticLevels>,
    pub candles: usize,
}

/// EMA(21) of the 5-minute closes, plus diagnostics once there are enough
/// candles for it.  Below [`EMA_PERIOD`] candles both are `None`.
pub fn compute_intraday(five_minute: &[Candle]) -> (Option<f64>, Option<IntradayDiagnostics>) {
    let n = five_minute.len();
    if n < EMA_PERIOD {
        return (None, None);
    }

    let closes: Vec<f64> = five_minute.iter().map(|c| c.close).collect();
    let highs: Vec<f64> = five_minute.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = five_minute.iter().map(|c| c.low).collect();

    let ema21 = latest_ema(&closes, EMA_PERIOD);

    let bands = bollinger(&closes, BB_PERIOD, BB_MULTIPLIER, warmup_for(BB_PERIOD, n));
    let stoch = stochastics(
        &highs,
        &lows,
        &closes,
        STOCH_K,
        STOCH_SMOOTH,
        STOCH_D,
        warmup_for(STOCH_K, n),
    );

    let diagnostics = IntradayDiagnostics {
        ema21_tail: last_value(&ema(&closes, EMA_PERIOD, warmup_for(EMA_PERIOD, n))),
        bollinger: bands
            .latest()
            .map(|(upper, mid, lower)| BandLevels { upper, mid, lower }),
        stochastic: last_value(&stoch.k).map(|k| StochasticLevels {
            k,
            d: last_value(&stoch.d),
        }),
        candles: n,
    };

    (ema21, Some(diagnostics))
}
