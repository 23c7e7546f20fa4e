use chrono::NaiveDate;
use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::types::Segment;

/// Number of columns in the instrument feed.
pub const FEED_COLUMNS: usize = 12;

/// Instrument metadata as carried by the broker's instrument feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub token: String,
    pub exchange_token: String,
    pub trading_symbol: String,
    /// Underlying name (`NIFTY`, `BANKNIFTY`, ...).  The feed calls it `name`.
    pub underlying: String,
    pub last_price: f64,
    /// Raw expiry text from the feed.
    pub expiry: String,
    pub expiry_date: Option<NaiveDate>,
    pub strike: f64,
    pub tick_size: f64,
    pub lot_size: u32,
    pub instrument_type: String,
    pub segment: Segment,
    pub exchange: String,
}

/// Why a feed row was not turned into an [`Instrument`].
#[derive(Debug, Clone, PartialEq)]
pub enum RowRejection {
    /// Fewer than [`FEED_COLUMNS`] fields.
    TooFewFields(usize),
    /// Segment outside the analysed universe; silently ignored.
    OtherSegment(String),
    /// Derivative row without a usable `yyyy-mm-dd` expiry.
    BadExpiry(String),
}

impl Instrument {
    /// Seeded index instrument.  Indices carry no expiry and are never pruned.
    pub fn index(token: &str, exchange_token: &str, symbol: &str) -> Self {
        Self {
            token: token.to_string(),
            exchange_token: exchange_token.to_string(),
            trading_symbol: symbol.to_string(),
            underlying: symbol.to_string(),
            last_price: 0.0,
            expiry: String::new(),
            expiry_date: None,
            strike: 0.0,
            tick_size: 0.05,
            lot_size: 1,
            instrument_type: "INDEX".to_string(),
            segment: Segment::Index,
            exchange: "NSE".to_string(),
        }
    }

    /// Build an instrument from one feed record.
    ///
    /// Numeric columns are parsed leniently (unparseable → 0); only the
    /// column count, the segment and a derivative's expiry can reject a row.
    pub fn from_record(record: &StringRecord) -> Result<Self, RowRejection> {
        if record.len() < FEED_COLUMNS {
            return Err(RowRejection::TooFewFields(record.len()));
        }
        let field = |i: usize| record.get(i).unwrap_or("").trim();

        let segment = match Segment::from_feed(field(10)) {
            Some(segment) => segment,
            None => return Err(RowRejection::OtherSegment(field(10).to_string())),
        };

        let expiry = field(5).to_string();
        let expiry_date = parse_expiry(&expiry);
        if segment.is_derivative() && expiry_date.is_none() {
            return Err(RowRejection::BadExpiry(expiry));
        }

        Ok(Self {
            token: field(0).to_string(),
            exchange_token: field(1).to_string(),
            trading_symbol: field(2).to_string(),
            underlying: field(3).trim_matches('"').to_string(),
            last_price: field(4).parse().unwrap_or_default(),
            expiry,
            expiry_date,
            strike: field(6).parse().unwrap_or_default(),
            tick_size: field(7).parse().unwrap_or_default(),
            lot_size: field(8).parse().unwrap_or_default(),
            instrument_type: field(9).to_string(),
            segment,
            exchange: field(11).to_string(),
        })
    }

    pub fn is_option(&self) -> bool {
        self.segment == Segment::OptionDerivative
    }

    pub fn is_future(&self) -> bool {
        self.segment == Segment::FutureDerivative
    }

    /// Case-insensitive match on the trimmed underlying name.
    pub fn has_underlying(&self, underlying: &str) -> bool {
        self.underlying.trim().eq_ignore_ascii_case(underlying.trim())
    }
}

/// `yyyy-mm-dd`; empty and `NA` mean "no expiry".
pub fn parse_expiry(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("NA") {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
