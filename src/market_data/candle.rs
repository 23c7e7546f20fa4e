use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLCV candle.  Timestamps are exchange-local wall-clock times;
/// storage identity and ordering use the timestamp alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Result of parsing one historical-data payload.
#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    pub candles: Vec<Candle>,
    /// Tuples rejected for shape or type problems.
    pub dropped: usize,
}

// ---------------------------------------------------------------------------
// Payload parsing
// ---------------------------------------------------------------------------

/// Parse a historical-data payload.
///
/// Accepts either a bare array of `[timestamp, open, high, low, close,
/// volume]` tuples or the broker envelope `{"data": {"candles": [...]}}`.
/// Malformed tuples are dropped one by one; they never fail the batch.
pub fn parse_candles(payload: &Value) -> ParsedBatch {
    let rows = match payload {
        Value::Array(rows) => rows.as_slice(),
        Value::Object(_) => match payload
            .pointer("/data/candles")
            .or_else(|| payload.get("candles"))
        {
            Some(Value::Array(rows)) => rows.as_slice(),
            _ => {
                debug!("payload object has no candles array");
                return ParsedBatch::default();
            }
        },
        _ => {
            debug!("payload is neither an array nor an object");
            return ParsedBatch::default();
        }
    };

    let mut batch = ParsedBatch {
        candles: Vec::with_capacity(rows.len()),
        dropped: 0,
    };

    for row in rows {
        match parse_candle_row(row) {
            Some(candle) => batch.candles.push(candle),
            None => {
                debug!(row = %row, "dropping malformed candle tuple");
                batch.dropped += 1;
            }
        }
    }

    batch
}

fn parse_candle_row(row: &Value) -> Option<Candle> {
    let fields = row.as_array()?;
    if fields.len() < 6 {
        return None;
    }

    let timestamp = parse_timestamp(fields[0].as_str()?)?;
    // Prices must be JSON numbers; numeric strings are rejected.
    let open = fields[1].as_f64()?;
    let high = fields[2].as_f64()?;
    let low = fields[3].as_f64()?;
    let close = fields[4].as_f64()?;
    let volume = parse_volume(&fields[5])?;

    Some(Candle {
        timestamp,
        open,
        high,
        low,
        close,
        volume,
    })
}

/// ISO-8601 timestamp with optional milliseconds and optional offset
/// (`+05:30` or `+0530`).  Offsets are dropped after conversion so the
/// result is the exchange-local wall time.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Volume must be a non-negative integer (integral floats and numeric
/// strings are tolerated).
fn parse_volume(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0 && *v <= u64::MAX as f64)
                .map(|v| v as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
