// =============================================================================
// Shared types used across the Aurora analytics core
// =============================================================================

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Candle bucket size. Only the two granularities the analytics pipeline
/// consumes are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "day")]
    Day,
    #[serde(rename = "5minute")]
    FiveMinute,
}

impl Interval {
    pub const ALL: [Interval; 2] = [Interval::Day, Interval::FiveMinute];

    /// Wire name used by the broker API and in payload file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::FiveMinute => "5minute",
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("day") {
            Ok(Self::Day)
        } else if trimmed.eq_ignore_ascii_case("5minute") {
            Ok(Self::FiveMinute)
        } else {
            Err(CoreError::UnsupportedInterval(trimmed.to_string()))
        }
    }
}

/// Market segment of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    Index,
    FutureDerivative,
    OptionDerivative,
}

impl Segment {
    /// Map the feed's segment column. Segments outside the analysed
    /// universe (cash equities, other exchanges) return `None`.
    pub fn from_feed(raw: &str) -> Option<Self> {
        match raw.trim() {
            "INDICES" => Some(Self::Index),
            "NFO-FUT" => Some(Self::FutureDerivative),
            "NFO-OPT" => Some(Self::OptionDerivative),
            _ => None,
        }
    }

    pub fn feed_name(&self) -> &'static str {
        match self {
            Self::Index => "INDICES",
            Self::FutureDerivative => "NFO-FUT",
            Self::OptionDerivative => "NFO-OPT",
        }
    }

    pub fn is_derivative(&self) -> bool {
        matches!(self, Self::FutureDerivative | Self::OptionDerivative)
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.feed_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_parses_wire_names() {
        assert_eq!("day".parse::<Interval>().unwrap(), Interval::Day);
        assert_eq!(" 5minute ".parse::<Interval>().unwrap(), Interval::FiveMinute);
        assert_eq!("DAY".parse::<Interval>().unwrap(), Interval::Day);
    }

    #[test]
    fn interval_rejects_unknown() {
        let err = "15minute".parse::<Interval>().unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedInterval(ref s) if s == "15minute"));
    }

    #[test]
    fn segment_feed_mapping() {
        assert_eq!(Segment::from_feed("NFO-OPT"), Some(Segment::OptionDerivative));
        assert_eq!(Segment::from_feed("NFO-FUT"), Some(Segment::FutureDerivative));
        assert_eq!(Segment::from_feed("INDICES"), Some(Segment::Index));
        assert_eq!(Segment::from_feed("NSE"), None);
        assert!(Segment::FutureDerivative.is_derivative());
        assert!(!Segment::Index.is_derivative());
        assert_eq!(Segment::OptionDerivative.to_string(), "NFO-OPT");
    }
}
