// =============================================================================
// Trading Calendar
// =============================================================================
//
// The analytics core only *consumes* calendar answers ("is this a trading
// day", "which day was the previous session", expiry Thursdays).  Where the
// holiday list comes from is the host application's business; this module
// provides the trait seam plus a weekend + fixed-holiday implementation.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::warn;

/// How far back `previous_trading_day` searches before giving up.
pub const PREVIOUS_DAY_LOOKBACK_DAYS: i64 = 30;

pub trait TradingCalendar: Send + Sync {
    fn is_trading_day(&self, date: NaiveDate) -> bool;

    /// Most recent trading day strictly before `date`, or `None` if none is
    /// found within [`PREVIOUS_DAY_LOOKBACK_DAYS`].
    fn previous_trading_day(&self, date: NaiveDate) -> Option<NaiveDate> {
        let mut candidate = date - Duration::days(1);
        for _ in 0..PREVIOUS_DAY_LOOKBACK_DAYS {
            if self.is_trading_day(candidate) {
                return Some(candidate);
            }
            candidate -= Duration::days(1);
        }
        warn!(
            from = %date,
            lookback_days = PREVIOUS_DAY_LOOKBACK_DAYS,
            "no previous trading day found within lookback"
        );
        None
    }

    /// Thursday of the Monday-based week containing `date`, rolled back to
    /// the nearest earlier trading day when the Thursday is a holiday.
    fn thursday_of_week(&self, date: NaiveDate) -> NaiveDate {
        let offset = Weekday::Thu.num_days_from_monday() as i64
            - date.weekday().num_days_from_monday() as i64;
        roll_back_to_trading_day(self, date + Duration::days(offset))
    }

    /// Last Thursday of the given month, rolled back over holidays.
    /// `None` for an invalid year/month.
    fn last_thursday_of_month(&self, year: i32, month: u32) -> Option<NaiveDate> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        let last_day = next_month.pred_opt().unwrap_or(first);
        let back = (last_day.weekday().num_days_from_monday() + 7
            - Weekday::Thu.num_days_from_monday())
            % 7;
        Some(roll_back_to_trading_day(self, last_day - Duration::days(back as i64)))
    }
}

fn roll_back_to_trading_day<C: TradingCalendar + ?Sized>(calendar: &C, mut date: NaiveDate) -> NaiveDate {
    for _ in 0..PREVIOUS_DAY_LOOKBACK_DAYS {
        if calendar.is_trading_day(date) {
            break;
        }
        date -= Duration::days(1);
    }
    date
}

/// Weekends plus an explicit holiday set are non-trading days.
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }
}

impl TradingCalendar for HolidayCalendar {
    fn is_trading_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekends_are_not_trading_days() {
        let cal = HolidayCalendar::default();
        assert!(cal.is_trading_day(d(2024, 3, 8))); // Friday
        assert!(!cal.is_trading_day(d(2024, 3, 9))); // Saturday
        assert!(!cal.is_trading_day(d(2024, 3, 10))); // Sunday
    }

    #[test]
    fn previous_trading_day_skips_weekend_and_holiday() {
        let cal = HolidayCalendar::new([d(2024, 3, 8)]);
        // Monday 11th -> Fri 8th is a holiday -> Thu 7th.
        assert_eq!(cal.previous_trading_day(d(2024, 3, 11)), Some(d(2024, 3, 7)));
        assert_eq!(cal.previous_trading_day(d(2024, 3, 13)), Some(d(2024, 3, 12)));
    }

    #[test]
    fn previous_trading_day_gives_up_after_lookback() {
        let start = d(2024, 1, 1);
        let holidays = (0..60).map(|i| start + Duration::days(i));
        let cal = HolidayCalendar::new(holidays);
        assert_eq!(cal.previous_trading_day(d(2024, 2, 20)), None);
    }

    #[test]
    fn thursday_of_week_forward_and_back() {
        let cal = HolidayCalendar::default();
        assert_eq!(cal.thursday_of_week(d(2024, 3, 4)), d(2024, 3, 7)); // Mon
        assert_eq!(cal.thursday_of_week(d(2024, 3, 7)), d(2024, 3, 7)); // Thu
        assert_eq!(cal.thursday_of_week(d(2024, 3, 10)), d(2024, 3, 7)); // Sun
    }

    #[test]
    fn thursday_holiday_rolls_back() {
        let cal = HolidayCalendar::new([d(2024, 3, 7)]);
        assert_eq!(cal.thursday_of_week(d(2024, 3, 5)), d(2024, 3, 6));
    }

    #[test]
    fn last_thursday_of_month() {
        let cal = HolidayCalendar::default();
        assert_eq!(cal.last_thursday_of_month(2024, 2), Some(d(2024, 2, 29)));
        assert_eq!(cal.last_thursday_of_month(2024, 12), Some(d(2024, 12, 26)));
        assert_eq!(cal.last_thursday_of_month(2024, 13), None);
    }

    #[test]
    fn last_thursday_holiday_rolls_back() {
        let cal = HolidayCalendar::new([d(2024, 3, 28)]);
        assert_eq!(cal.last_thursday_of_month(2024, 3), Some(d(2024, 3, 27)));
    }
}
