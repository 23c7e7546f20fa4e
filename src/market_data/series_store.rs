use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::candle::Candle;
use crate::types::Interval;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Composite key that identifies a unique candle series.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CandleKey {
    pub token: String,
    pub interval: Interval,
}

impl CandleKey {
    pub fn new(token: impl Into<String>, interval: Interval) -> Self {
        Self {
            token: token.into(),
            interval,
        }
    }
}

impl std::fmt::Display for CandleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.token, self.interval)
    }
}

/// Bookkeeping for one merge, mostly for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub received: usize,
    pub before: usize,
    pub after: usize,
}

impl MergeStats {
    /// Incoming candles that collapsed onto an existing timestamp.
    pub fn duplicates(&self) -> usize {
        (self.before + self.received) - self.after
    }
}

// ---------------------------------------------------------------------------
// HistoricalStore -- ordered, deduplicated series per (token, interval)
// ---------------------------------------------------------------------------

/// Ordered candle history per `(token, interval)` pair.
///
/// Every series is strictly ascending by timestamp with no repeated
/// timestamps.  The only mutation is [`HistoricalStore::merge`]; nothing is
/// ever trimmed except by its dedup step.
#[derive(Debug, Default)]
pub struct HistoricalStore {
    series: HashMap<CandleKey, Vec<Candle>>,
}

impl HistoricalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch into the series for `(token, interval)`.
    ///
    /// The batch is appended, the whole series is stable-sorted by timestamp,
    /// then adjacent duplicates are removed keeping the first occurrence.
    /// Candles already stored therefore win over re-sent candles with the same
    /// timestamp.
    ///
    /// Returns `None` (and leaves the store untouched) for an empty batch.
    pub fn merge(&mut self, token: &str, interval: Interval, candles: Vec<Candle>) -> Option<MergeStats> {
        if candles.is_empty() {
            return None;
        }

        let key = CandleKey::new(token, interval);
        let series = self.series.entry(key.clone()).or_default();
        let before = series.len();
        let received = candles.len();

        series.extend(candles);
        series.sort_by_key(|c| c.timestamp);
        series.dedup_by_key(|c| c.timestamp);

        let stats = MergeStats {
            received,
            before,
            after: series.len(),
        };
        debug!(
            key = %key,
            received,
            before,
            after = stats.after,
            duplicates = stats.duplicates(),
            "series merged"
        );
        Some(stats)
    }

    /// The stored series, oldest first.  `None` if nothing was ever merged.
    pub fn series(&self, token: &str, interval: Interval) -> Option<&[Candle]> {
        self.series
            .get(&CandleKey::new(token, interval))
            .map(Vec::as_slice)
    }

    pub fn len(&self, token: &str, interval: Interval) -> usize {
        self.series(token, interval).map_or(0, <[Candle]>::len)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
