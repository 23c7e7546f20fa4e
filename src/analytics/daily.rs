// =============================================================================
// Daily Analytics
// =============================================================================
//
// Runs after every merge into a token's `day` series.  Each metric has its
// own minimum-history gate; a metric whose gate fails is cleared rather than
// left stale.
//
//   prev_day_close  >= 1 candle    close of the last candle
//   volatility      >= 22 candles  log-return σ over lookbacks 3/5/8/13/21
//   range_bands     volatility + prev_day_close > 0
//                   delta = pdc · avg · φ,  upper = ⌈pdc + delta⌉,
//                   lower = ⌊pdc − delta⌋
//   swing_7d/21d    >= 7 / 21 candles, trailing high/low
//   ema21_daily     >= 21 candles, final EMA(21) value
//
// Pivot levels and the warm-up gated EMA series are kept as diagnostics only.

use serde::Serialize;

use super::snapshot::{AnalyticsSnapshot, RangeBands, SwingLevels};
use super::{warmup_for, EMA_PERIOD};
use crate::indicators::{
    combine_volatilities, ema, historical_volatility, last_value, latest_ema, PivotSet,
    VolatilityStats,
};
use crate::market_data::Candle;

pub const VOLATILITY_LOOKBACKS: [usize; 5] = [3, 5, 8, 13, 21];
pub const MIN_VOLATILITY_CANDLES: usize = 22;
/// Golden ratio multiplier applied to the volatility-scaled delta.
pub const RANGE_BAND_PHI: f64 = 1.618034;
pub const SWING_SHORT: usize = 7;
pub const SWING_LONG: usize = 21;

/// Values derived from the daily series, before they are written into a
/// snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyMetrics {
    pub prev_day_close: Option<f64>,
    pub volatility: Option<VolatilityStats>,
    pub range_bands: Option<RangeBands>,
    pub ema21: Option<f64>,
    pub swing_7d: Option<SwingLevels>,
    pub swing_21d: Option<SwingLevels>,
}

impl DailyMetrics {
    /// Overwrite the daily fields of `snapshot`; other fields are untouched.
    pub fn apply(&self, snapshot: &mut AnalyticsSnapshot) {
        snapshot.prev_day_close = self.prev_day_close;
        snapshot.volatility = self.volatility;
        snapshot.range_bands = self.range_bands;
        snapshot.ema21_daily = self.ema21;
        snapshot.swing_7d = self.swing_7d;
        snapshot.swing_21d = self.swing_21d;
    }
}

/// Not persisted in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyDiagnostics {
    /// Pivots from the most recent daily candle.
    pub pivots: Option<PivotSet>,
    /// Last value of the warm-up gated EMA(21) series.
    pub ema21_tail: Option<f64>,
    pub warmup: usize,
    pub candles: usize,
}

pub fn compute_daily(daily: &[Candle]) -> (DailyMetrics, DailyDiagnostics) {
    let closes: Vec<f64> = daily.iter().map(|c| c.close).collect();
    let n = closes.len();

    let prev_day_close = daily.last().map(|c| c.close);
    let volatility = if n >= MIN_VOLATILITY_CANDLES {
        volatility_stats(&closes)
    } else {
        None
    };
    let range_bands = match (prev_day_close, volatility.as_ref()) {
        (Some(pdc), Some(vol)) => range_bands(pdc, vol),
        _ => None,
    };

    let metrics = DailyMetrics {
        prev_day_close,
        volatility,
        range_bands,
        ema21: if n >= EMA_PERIOD { latest_ema(&closes, EMA_PERIOD) } else { None },
        swing_7d: if n >= SWING_SHORT { swing_levels(daily, SWING_SHORT) } else { None },
        swing_21d: if n >= SWING_LONG { swing_levels(daily, SWING_LONG) } else { None },
    };

    let warmup = warmup_for(EMA_PERIOD, n);
    let diagnostics = DailyDiagnostics {
        pivots: daily.last().map(|c| PivotSet::from_hlc(c.high, c.low, c.close)),
        ema21_tail: last_value(&ema(&closes, EMA_PERIOD, warmup)),
        warmup,
        candles: n,
    };

    (metrics, diagnostics)
}

/// Combined volatility across [`VOLATILITY_LOOKBACKS`].
///
/// Returns None when:
/// - fewer than [`MIN_VOLATILITY_CANDLES`] closes are available
/// - any lookback cannot be computed (a non-positive close in its window)
pub fn volatility_stats(closes: &[f64]) -> Option<VolatilityStats> {
    if closes.len() < MIN_VOLATILITY_CANDLES {
        return None;
    }
    let vols = VOLATILITY_LOOKBACKS
        .iter()
        .map(|&lookback| historical_volatility(closes, lookback))
        .collect::<Option<Vec<f64>>>()?;
    combine_volatilities(&vols)
}

/// Bands around the previous close.  `None` unless the close is positive.
pub fn range_bands(prev_day_close: f64, volatility: &VolatilityStats) -> Option<RangeBands> {
    if prev_day_close.is_nan() || prev_day_close <= 0.0 {
        return None;
    }
    let delta = prev_day_close * volatility.avg * RANGE_BAND_PHI;
    let upper = (prev_day_close + delta).ceil();
    let lower = (prev_day_close - delta).floor();
    (upper.is_finite() && lower.is_finite()).then_some(RangeBands { upper, lower })
}

/// Highest high and lowest low over the trailing `period` candles.
///
/// Candles with `low <= 0` or `high < low` are ignored.  `None` if no candle
/// in the window qualifies.
pub fn swing_levels(candles: &[Candle], period: usize) -> Option<SwingLevels> {
    if period == 0 {
        return None;
    }
    let start = candles.len().saturating_sub(period);
    candles[start..]
        .iter()
        .filter(|c| c.low > 0.0 && c.high >= c.low)
        .fold(None, |acc: Option<SwingLevels>, c| {
            Some(match acc {
                None => SwingLevels { high: c.high, low: c.low },
                Some(s) => SwingLevels {
                    high: s.high.max(c.high),
                    low: s.low.min(c.low),
                },
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn daily_series(closes: &[f64]) -> Vec<Candle> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: start + Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000,
            })
            .collect()
    }

    fn hl_series(highs: &[f64], lows: &[f64]) -> Vec<Candle> {
        let mut candles = daily_series(&vec![10.0; highs.len()]);
        for (c, (&h, &l)) in candles.iter_mut().zip(highs.iter().zip(lows)) {
            c.high = h;
            c.low = l;
        }
        candles
    }

    fn trending(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 * 1.01_f64.powi(i as i32) + (i % 3) as f64).collect()
    }

    // ---- range_bands ----

    #[test]
    fn range_band_example() {
        let vol = VolatilityStats { avg: 0.02, min: 0.01, max: 0.03 };
        let bands = range_bands(100.0, &vol).unwrap();
        assert_eq!(bands.upper, 104.0);
        assert_eq!(bands.lower, 96.0);
    }

    #[test]
    fn range_band_requires_positive_close() {
        let vol = VolatilityStats { avg: 0.02, min: 0.01, max: 0.03 };
        assert!(range_bands(0.0, &vol).is_none());
        assert!(range_bands(f64::NAN, &vol).is_none());
    }

    // ---- swing_levels ----

    #[test]
    fn swing_example() {
        let candles = hl_series(
            &[10.0, 12.0, 9.0, 15.0, 11.0, 14.0, 13.0],
            &[8.0, 9.0, 7.0, 10.0, 9.0, 11.0, 10.0],
        );
        assert_eq!(swing_levels(&candles, 7), Some(SwingLevels { high: 15.0, low: 7.0 }));
    }

    #[test]
    fn swing_uses_trailing_window_and_skips_invalid() {
        let candles = hl_series(
            &[50.0, 12.0, 9.0, 15.0, 11.0, 14.0, 13.0, 99.0],
            &[1.0, 9.0, 7.0, 10.0, 9.0, 11.0, 10.0, 0.0],
        );
        // First candle falls outside the window; the last has low == 0.
        assert_eq!(swing_levels(&candles, 7), Some(SwingLevels { high: 15.0, low: 7.0 }));
    }

    #[test]
    fn swing_none_without_valid_candle() {
        let candles = hl_series(&[5.0, 5.0], &[6.0, 0.0]);
        assert!(swing_levels(&candles, 7).is_none());
    }

    // ---- volatility_stats ----

    #[test]
    fn volatility_needs_22_closes() {
        assert!(volatility_stats(&trending(21)).is_none());
        let stats = volatility_stats(&trending(22)).unwrap();
        assert!(stats.min <= stats.max);
        assert!(stats.avg > 0.0);
    }

    #[test]
    fn zero_close_inside_lookbacks_fails_volatility() {
        let mut closes = trending(22);
        closes[10] = 0.0;
        assert!(volatility_stats(&closes).is_none());
    }

    // ---- compute_daily ----

    #[test]
    fn short_series_only_sets_prev_close() {
        let (m, d) = compute_daily(&daily_series(&[100.0, 101.0, 102.0]));
        assert_eq!(m.prev_day_close, Some(102.0));
        assert!(m.volatility.is_none());
        assert!(m.range_bands.is_none());
        assert!(m.swing_7d.is_none());
        assert!(m.ema21.is_none());
        assert!(d.pivots.is_some());
        assert_eq!(d.warmup, 3);
    }

    #[test]
    fn full_series_sets_everything() {
        let (m, d) = compute_daily(&daily_series(&trending(30)));
        assert!(m.volatility.is_some());
        assert!(m.range_bands.is_some());
        assert!(m.swing_7d.is_some());
        assert!(m.swing_21d.is_some());
        assert!(m.ema21.is_some());
        // With fewer candles than the warm-up policy the tail equals the
        // plain recurrence.
        assert!((d.ema21_tail.unwrap() - m.ema21.unwrap()).abs() < 1e-9);
    }

    #[test]
    fn constant_closes_give_zero_volatility_bands_at_close() {
        let (m, _) = compute_daily(&daily_series(&[250.0; 25]));
        let vol = m.volatility.unwrap();
        assert_eq!(vol.avg, 0.0);
        assert_eq!(m.range_bands, Some(RangeBands { upper: 250.0, lower: 250.0 }));
        assert!((m.ema21.unwrap() - 250.0).abs() < 1e-9);
    }

    #[test]
    fn apply_only_touches_daily_fields() {
        let mut snap = AnalyticsSnapshot {
            ema21_5min: Some(42.0),
            ..Default::default()
        };
        let (m, _) = compute_daily(&daily_series(&[100.0]));
        m.apply(&mut snap);
        assert_eq!(snap.prev_day_close, Some(100.0));
        assert_eq!(snap.ema21_5min, Some(42.0));
    }
}
