// =============================================================================
// History request planning
// =============================================================================
//
// Works out the window a network collaborator should fetch for a token and
// interval.  Daily analytics need ~250 sessions (about 400 calendar days);
// 5-minute analytics only need the last few sessions.  Fetching itself
// happens outside this crate.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::types::Interval;

/// Broker-API bound format: `yyyy-MM-dd+HH:mm:ss`.
const REQUEST_BOUND_FORMAT: &str = "%Y-%m-%d+%H:%M:%S";

/// Calendar days of history requested per interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindows {
    pub daily_days: i64,
    pub intraday_days: i64,
}

impl Default for HistoryWindows {
    fn default() -> Self {
        Self {
            daily_days: 400,
            intraday_days: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRequest {
    pub token: String,
    pub interval: Interval,
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl HistoryRequest {
    pub fn plan(token: &str, interval: Interval, today: NaiveDate, windows: HistoryWindows) -> Self {
        let days_back = match interval {
            Interval::Day => windows.daily_days,
            Interval::FiveMinute => windows.intraday_days,
        };
        let from = (today - Duration::days(days_back)).and_time(session_open());
        let to = today.and_time(session_close());
        Self {
            token: token.to_string(),
            interval,
            from,
            to,
        }
    }

    pub fn from_param(&self) -> String {
        self.from.format(REQUEST_BOUND_FORMAT).to_string()
    }

    pub fn to_param(&self) -> String {
        self.to.format(REQUEST_BOUND_FORMAT).to_string()
    }
}

fn session_open() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 15, 0).unwrap_or(NaiveTime::MIN)
}

fn session_close() -> NaiveTime {
    NaiveTime::from_hms_opt(15, 30, 0).unwrap_or(NaiveTime::MIN)
}
