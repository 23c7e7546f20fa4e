// =============================================================================
// Data Core: the single owner of registry, store and analytics
// =============================================================================
//
// One explicitly constructed instance replaces any process-wide singleton.
// All mutation goes through `&mut self`, so the core itself needs no locks;
// the runtime shares it as `Arc<RwLock<DataCore>>` with the dispatcher task
// as the only writer.
//
// Ingestion surface:
//   on_instruments_fetched        reload the instrument registry from a file
//   on_historical_data_received   parse, merge, recompute analytics
//
// Everything else is a read-only query.
// =============================================================================

use std::path::Path;

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::analytics::{AnalyticsEngine, AnalyticsSnapshot, DailyDiagnostics, IntradayDiagnostics};
use crate::calendar::{HolidayCalendar, TradingCalendar};
use crate::error::CoreResult;
use crate::instruments::{export_snapshot, Instrument, InstrumentRegistry, LoadSummary};
use crate::instruments::{NIFTY_50_TOKEN, NIFTY_BANK_TOKEN};
use crate::market_data::{parse_candles, Candle, HistoricalStore, HistoryRequest, MergeStats};
use crate::runtime_config::RuntimeConfig;
use crate::types::Interval;

/// Source of "now" in exchange-local wall time.
pub type Clock = Box<dyn Fn() -> NaiveDateTime + Send + Sync>;

pub fn local_clock() -> Clock {
    Box::new(|| Local::now().naive_local())
}

pub struct DataCore {
    config: RuntimeConfig,
    registry: InstrumentRegistry,
    store: HistoricalStore,
    engine: AnalyticsEngine,
    calendar: Box<dyn TradingCalendar>,
    clock: Clock,
}

impl DataCore {
    /// Core with a holiday calendar from `config` and the local wall clock.
    pub fn new(config: RuntimeConfig) -> Self {
        let calendar = HolidayCalendar::new(config.holidays.iter().copied());
        Self::with_collaborators(config, Box::new(calendar), local_clock())
    }

    pub fn with_collaborators(config: RuntimeConfig, calendar: Box<dyn TradingCalendar>, clock: Clock) -> Self {
        let registry = InstrumentRegistry::new(config.underlyings.clone());
        Self {
            config,
            registry,
            store: HistoricalStore::new(),
            engine: AnalyticsEngine::new(),
            calendar,
            clock,
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Reload instruments from `path`.  On failure the registry is unchanged.
    ///
    /// When enabled in the config, the pruned registry is exported afterwards;
    /// an export failure is logged and does not fail the reload.
    pub fn on_instruments_fetched(&mut self, path: &Path) -> CoreResult<LoadSummary> {
        let today = self.today();
        let summary = self.registry.load_file(path, today)?;

        if self.config.export_parsed_instruments {
            if let Err(e) = export_snapshot(&self.registry, &self.config.export_dir, today) {
                warn!(error = %e, "instrument snapshot export failed");
            }
        }
        Ok(summary)
    }

    /// Parse a historical-data payload and merge it.  Returns `None` when the
    /// payload held no usable candle.
    pub fn on_historical_data_received(
        &mut self,
        token: &str,
        interval: Interval,
        payload: &Value,
    ) -> Option<MergeStats> {
        let batch = parse_candles(payload);
        if batch.dropped > 0 {
            warn!(token, %interval, dropped = batch.dropped, "malformed candles dropped");
        }
        debug!(token, %interval, parsed = batch.candles.len(), "historical data received");
        self.on_candles(token, interval, batch.candles)
    }

    /// Merge already-typed candles and recompute analytics for the interval.
    pub fn on_candles(&mut self, token: &str, interval: Interval, candles: Vec<Candle>) -> Option<MergeStats> {
        let stats = self.store.merge(token, interval, candles)?;
        let now = self.now();
        self.engine.on_series_updated(
            token,
            interval,
            &self.store,
            &self.registry,
            self.calendar.as_ref(),
            now,
        );
        Some(stats)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn instrument(&self, token: &str) -> Option<&Instrument> {
        self.registry.get(token)
    }

    /// All registered instruments, sorted by token.
    pub fn instruments(&self) -> Vec<&Instrument> {
        self.registry.list()
    }

    pub fn registry(&self) -> &InstrumentRegistry {
        &self.registry
    }

    pub fn series(&self, token: &str, interval: Interval) -> Option<&[Candle]> {
        self.store.series(token, interval)
    }

    pub fn snapshot(&self, token: &str) -> Option<&AnalyticsSnapshot> {
        self.engine.snapshot(token)
    }

    /// Tokens that currently have a snapshot, sorted.
    pub fn snapshot_tokens(&self) -> Vec<&str> {
        self.engine.tokens()
    }

    pub fn daily_diagnostics(&self, token: &str) -> Option<&DailyDiagnostics> {
        self.engine.daily_diagnostics(token)
    }

    pub fn intraday_diagnostics(&self, token: &str) -> Option<&IntradayDiagnostics> {
        self.engine.intraday_diagnostics(token)
    }

    pub fn nearest_weekly_expiry(&self, underlying: &str) -> Option<NaiveDate> {
        self.registry.nearest_weekly_expiry(underlying, self.today())
    }

    pub fn monthly_expiry(&self, underlying: &str) -> Option<NaiveDate> {
        self.registry.monthly_expiry_in_month(underlying, self.today())
    }

    pub fn options_for(&self, underlying: &str, expiry: NaiveDate) -> Vec<&Instrument> {
        self.registry.options_for(underlying, expiry)
    }

    pub fn current_month_future_token(&self, underlying: &str) -> Option<&str> {
        self.registry.current_month_future_token(underlying, self.today())
    }

    /// History a network collaborator should fetch: both indices plus each
    /// configured underlying's current-month future, at both intervals.
    pub fn history_requests(&self, today: NaiveDate) -> Vec<HistoryRequest> {
        let windows = self.config.history_windows();

        let mut tokens: Vec<&str> = vec![NIFTY_50_TOKEN, NIFTY_BANK_TOKEN];
        for underlying in self.registry.underlyings() {
            match self.registry.current_month_future_token(underlying, today) {
                Some(token) => tokens.push(token),
                None => debug!(underlying = %underlying, "no current-month future registered"),
            }
        }

        let requests: Vec<HistoryRequest> = tokens
            .iter()
            .flat_map(|token| {
                Interval::ALL
                    .into_iter()
                    .map(move |interval| HistoryRequest::plan(token, interval, today, windows))
            })
            .collect();
        info!(count = requests.len(), "history requests planned");
        requests
    }
}
