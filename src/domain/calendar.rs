//! Exchange trading-hours oracle.
//!
//! Pure function of the instant asked about, the exchange offset, the
//! trading-day set and a holiday list. Holds no clock of its own.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc,
    Weekday,
};
use serde::Serialize;
use std::collections::BTreeSet;

/// Upper bound on how far ahead `next_open` searches.
const MAX_SEARCH_DAYS: i64 = 366;

#[derive(Debug, Clone, PartialEq)]
pub struct MarketCalendar {
    pub utc_offset: FixedOffset,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub trading_days: Vec<Weekday>,
    pub holidays: BTreeSet<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketStatus {
    pub is_open: bool,
    pub next_open: Option<DateTime<Utc>>,
}

impl Default for MarketCalendar {
    /// Oslo Børs regular session.
    fn default() -> Self {
        MarketCalendar {
            utc_offset: FixedOffset::east_opt(3600).unwrap_or_else(|| Utc.fix()),
            open_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            close_time: NaiveTime::from_hms_opt(16, 20, 0).unwrap_or_default(),
            trading_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            holidays: BTreeSet::new(),
        }
    }
}

impl MarketCalendar {
    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        self.trading_days.contains(&date.weekday()) && !self.holidays.contains(&date)
    }

    /// Open iff the exchange-local time falls in `[open, close)` on a
    /// trading day.
    pub fn is_open(&self, at: DateTime<Utc>) -> bool {
        let local = at.with_timezone(&self.utc_offset);
        let time = local.time();
        self.is_trading_day(local.date_naive()) && time >= self.open_time && time < self.close_time
    }

    /// Next session open strictly after `at`. `None` when no trading day
    /// exists within the search window.
    pub fn next_open(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let local_date = at.with_timezone(&self.utc_offset).date_naive();
        (0..=MAX_SEARCH_DAYS)
            .map(|offset| local_date + Duration::days(offset))
            .filter(|date| self.is_trading_day(*date))
            .filter_map(|date| self.open_on(date))
            .find(|open| *open > at)
    }

    pub fn status(&self, at: DateTime<Utc>) -> MarketStatus {
        MarketStatus {
            is_open: self.is_open(at),
            next_open: self.next_open(at),
        }
    }

    fn open_on(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        self.utc_offset
            .from_local_datetime(&date.and_time(self.open_time))
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }
}
