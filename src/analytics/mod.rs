// =============================================================================
// Analytics
// =============================================================================
//
// Derived metrics recomputed after each series merge.  The calculators are
// plain functions over candle slices; `AnalyticsEngine` owns the resulting
// snapshots and decides which calculators run for a merged interval.

pub mod daily;
pub mod engine;
pub mod intraday;
pub mod snapshot;
pub mod vwap_stats;

pub use daily::{DailyDiagnostics, DailyMetrics};
pub use engine::AnalyticsEngine;
pub use intraday::{BandLevels, IntradayDiagnostics, StochasticLevels};
pub use snapshot::{AnalyticsSnapshot, RangeBands, SwingLevels, VwapStats};

/// Period shared by the daily and 5-minute EMA.
pub const EMA_PERIOD: usize = 21;

/// Warm-up applied to diagnostic indicator series:
/// `min(max(5 · period, 200), len)`.
pub fn warmup_for(period: usize, len: usize) -> usize {
    (5 * period).max(200).min(len)
}
