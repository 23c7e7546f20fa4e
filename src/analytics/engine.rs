// =============================================================================
// Analytics Engine
// =============================================================================
//
// Owns the per-token snapshot map and the diagnostics maps.  After the store
// merges a batch, `on_series_updated` runs the calculators that belong to the
// merged interval:
//
//   day      -> daily calculator
//   5minute  -> intraday calculator, then previous-day VWAP for futures
//
// Every calculator follows the same shape: fetch the token's snapshot (or a
// default one), overwrite its own fields, store it back.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use tracing::{debug, info};

use super::daily::{compute_daily, DailyDiagnostics};
use super::intraday::{compute_intraday, IntradayDiagnostics};
use super::snapshot::AnalyticsSnapshot;
use super::vwap_stats::previous_day_vwap;
use crate::calendar::TradingCalendar;
use crate::instruments::InstrumentRegistry;
use crate::market_data::{Candle, HistoricalStore};
use crate::types::{Interval, Segment};

#[derive(Debug, Default)]
pub struct AnalyticsEngine {
    snapshots: HashMap<String, AnalyticsSnapshot>,
    daily_diagnostics: HashMap<String, DailyDiagnostics>,
    intraday_diagnostics: HashMap<String, IntradayDiagnostics>,
}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute everything that depends on `(token, interval)`.
    pub fn on_series_updated(
        &mut self,
        token: &str,
        interval: Interval,
        store: &HistoricalStore,
        registry: &InstrumentRegistry,
        calendar: &dyn TradingCalendar,
        now: NaiveDateTime,
    ) {
        let label = registry
            .get(token)
            .map(|i| i.trading_symbol.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(token);

        match interval {
            Interval::Day => self.run_daily(token, label, store.series(token, Interval::Day), now),
            Interval::FiveMinute => {
                let five = store.series(token, Interval::FiveMinute).unwrap_or(&[]);
                self.run_intraday(token, label, five, now);

                let is_future = registry
                    .get(token)
                    .is_some_and(|i| i.segment == Segment::FutureDerivative);
                if is_future {
                    self.run_previous_day_vwap(token, label, five, calendar, now);
                }
            }
        }
    }

    /// Daily calculator.  A missing daily series drops the snapshot.
    pub fn run_daily(&mut self, token: &str, label: &str, daily: Option<&[Candle]>, now: NaiveDateTime) {
        let Some(daily) = daily.filter(|s| !s.is_empty()) else {
            if self.snapshots.remove(token).is_some() {
                debug!(token, "daily series unavailable, snapshot dropped");
            }
            self.daily_diagnostics.remove(token);
            return;
        };

        let (metrics, diagnostics) = compute_daily(daily);

        let snapshot = self.snapshots.entry(token.to_string()).or_default();
        metrics.apply(snapshot);
        snapshot.last_calculation_time = Some(now);

        info!(
            token,
            symbol = label,
            candles = daily.len(),
            prev_close = ?snapshot.prev_day_close,
            volatility = ?snapshot.volatility.map(|v| v.avg),
            range = ?snapshot.range_bands.map(|b| (b.lower, b.upper)),
            swing_7d = ?snapshot.swing_7d.map(|s| (s.low, s.high)),
            swing_21d = ?snapshot.swing_21d.map(|s| (s.low, s.high)),
            ema21 = ?snapshot.ema21_daily,
            "daily analytics updated"
        );
        debug!(
            token,
            warmup = diagnostics.warmup,
            ema21_tail = ?diagnostics.ema21_tail,
            pivots = ?diagnostics.pivots.map(|p| p.classic),
            "daily diagnostics"
        );
        self.daily_diagnostics.insert(token.to_string(), diagnostics);
    }

    /// 5-minute calculator.  Daily fields are left as they are.
    pub fn run_intraday(&mut self, token: &str, label: &str, five_minute: &[Candle], now: NaiveDateTime) {
        let (ema21, diagnostics) = compute_intraday(five_minute);

        let snapshot = self.snapshots.entry(token.to_string()).or_default();
        snapshot.ema21_5min = ema21;
        snapshot.last_calculation_time = Some(now);

        if let Some(ema) = ema21 {
            info!(token, symbol = label, ema21 = ema, "5-minute analytics updated");
        }
        match diagnostics {
            Some(diag) => {
                debug!(
                    token,
                    bollinger = ?diag.bollinger,
                    stochastic = ?diag.stochastic,
                    "5-minute diagnostics"
                );
                self.intraday_diagnostics.insert(token.to_string(), diag);
            }
            None => {
                self.intraday_diagnostics.remove(token);
            }
        }
    }

    /// Previous-session VWAP stats.  Skipped when the calendar cannot name a
    /// previous trading day.
    pub fn run_previous_day_vwap(
        &mut self,
        token: &str,
        label: &str,
        five_minute: &[Candle],
        calendar: &dyn TradingCalendar,
        now: NaiveDateTime,
    ) {
        if five_minute.is_empty() {
            return;
        }
        let Some(session) = calendar.previous_trading_day(now.date()) else {
            debug!(token, today = %now.date(), "previous trading day unresolved, VWAP stats skipped");
            return;
        };

        let stats = previous_day_vwap(five_minute, session);

        let snapshot = self.snapshots.entry(token.to_string()).or_default();
        snapshot.prev_day_vwap = stats;
        snapshot.last_calculation_time = Some(now);

        match stats {
            Some(s) => info!(
                token,
                symbol = label,
                session = %session,
                high = s.high,
                low = s.low,
                close = s.close,
                "previous-day VWAP updated"
            ),
            None => debug!(token, session = %session, "no qualifying candles for previous-day VWAP"),
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn snapshot(&self, token: &str) -> Option<&AnalyticsSnapshot> {
        self.snapshots.get(token)
    }

    pub fn daily_diagnostics(&self, token: &str) -> Option<&DailyDiagnostics> {
        self.daily_diagnostics.get(token)
    }

    pub fn intraday_diagnostics(&self, token: &str) -> Option<&IntradayDiagnostics> {
        self.intraday_diagnostics.get(token)
    }

    /// Tokens with a snapshot, sorted.
    pub fn tokens(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self.snapshots.keys().map(String::as_str).collect();
        tokens.sort_unstable();
        tokens
    }
}
