use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::indicators::VolatilityStats;

/// Price bands around the previous close, scaled by average volatility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeBands {
    pub upper: f64,
    pub lower: f64,
}

/// Highest high / lowest low over a trailing window of daily candles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingLevels {
    pub high: f64,
    pub low: f64,
}

/// Running-VWAP extremes and final value over one session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VwapStats {
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Derived metrics for one instrument.
///
/// A metric that is `None` has not been calculated, either because the
/// input series is too short or because the inputs were degenerate.  Each
/// calculator owns a fixed group of fields and leaves the others alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    // ── Daily ──────────────────────────────────────────────────────────
    pub prev_day_close: Option<f64>,
    pub volatility: Option<VolatilityStats>,
    pub range_bands: Option<RangeBands>,
    pub ema21_daily: Option<f64>,
    pub swing_7d: Option<SwingLevels>,
    pub swing_21d: Option<SwingLevels>,

    // ── 5-minute ───────────────────────────────────────────────────────
    pub ema21_5min: Option<f64>,

    // ── Futures only ───────────────────────────────────────────────────
    pub prev_day_vwap: Option<VwapStats>,

    pub last_calculation_time: Option<NaiveDateTime>,
}
