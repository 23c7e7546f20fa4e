// =============================================================================
// Previous-Day VWAP Statistics (futures only)
// =============================================================================
//
// Runs the intraday VWAP over the previous trading session's 5-minute
// candles and reports the extremes of the running value plus its final
// value.  Candles with an inverted range, zero volume, or a negative low or
// close are left out before the VWAP is accumulated.

use chrono::NaiveDate;

use super::snapshot::VwapStats;
use crate::indicators::vwap;
use crate::market_data::Candle;

fn qualifies(c: &Candle) -> bool {
    c.volume > 0
        && c.high >= c.low
        && c.low >= 0.0
        && c.close >= 0.0
        && c.high.is_finite()
        && c.close.is_finite()
}

/// VWAP statistics for `session`.  `None` if no candle on that date qualifies.
pub fn previous_day_vwap(five_minute: &[Candle], session: NaiveDate) -> Option<VwapStats> {
    let day: Vec<&Candle> = five_minute
        .iter()
        .filter(|c| c.timestamp.date() == session)
        .filter(|c| qualifies(c))
        .collect();
    if day.is_empty() {
        return None;
    }

    let high: Vec<f64> = day.iter().map(|c| c.high).collect();
    let low: Vec<f64> = day.iter().map(|c| c.low).collect();
    let close: Vec<f64> = day.iter().map(|c| c.close).collect();
    let volume: Vec<f64> = day.iter().map(|c| c.volume as f64).collect();
    let timestamps: Vec<_> = day.iter().map(|c| c.timestamp).collect();

    let running: Vec<f64> = vwap(&high, &low, &close, &volume, &timestamps)
        .into_iter()
        .flatten()
        .collect();

    let close = *running.last()?;
    let (high, low) = running
        .iter()
        .fold((f64::NEG_INFINITY, f64::INFINITY), |(hi, lo), &v| (hi.max(v), lo.min(v)));

    Some(VwapStats { high, low, close })
}
