use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use time::{Date, Duration, Month, OffsetDateTime};

pub mod grid;

pub use grid::{body_cells, build_grid, GridCell, GRID_CELLS, GRID_COLUMNS};

/// Short weekday labels in display order (weeks start on Monday).
pub const WEEKDAY_SHORT: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("month {0} is out of range (expected 0-11)")]
    InvalidMonth(u8),
    #[error("{year:04}-{month:02}-{day:02} is not a valid calendar date")]
    InvalidDate { year: i32, month: u8, day: u8 },
    #[error("date arithmetic left the supported range")]
    OutOfRange,
    #[error("malformed date key '{0}' (expected YYYY-MM-DD)")]
    MalformedKey(String),
}

/// A calendar day without a time component.
///
/// Months are zero-based (`0` = January) to match the grid and view-state
/// arithmetic; the `YYYY-MM-DD` key form uses the usual one-based month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(Date);

impl CalendarDate {
    pub fn new(year: i32, month: u8, day: u8) -> Result<Self, DateError> {
        let month_value = month_from_index(month)?;
        Date::from_calendar_date(year, month_value, day)
            .map(Self)
            .map_err(|_| DateError::InvalidDate {
                year,
                month: month + 1,
                day,
            })
    }

    /// Builds a date the way `Date(year, month, day)` rolls in a browser:
    /// months outside 0-11 carry into the year and days outside the month
    /// carry into neighbouring months (day 0 is the previous month's last day).
    pub fn normalized(year: i32, month: i32, day: i32) -> Result<Self, DateError> {
        let year = year
            .checked_add(month.div_euclid(12))
            .ok_or(DateError::OutOfRange)?;
        let month = month.rem_euclid(12) as u8;
        Self::first_of_month(year, month)?.add_days(i64::from(day) - 1)
    }

    pub fn first_of_month(year: i32, month: u8) -> Result<Self, DateError> {
        Self::new(year, month, 1)
    }

    /// Current local calendar date, falling back to UTC when the local
    /// offset cannot be determined.
    pub fn today() -> Self {
        let now = OffsetDateTime::now_local().unwrap_or_else(|err| {
            tracing::debug!(?err, "local UTC offset unavailable, using UTC date");
            OffsetDateTime::now_utc()
        });
        Self(now.date())
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Zero-based month (0 = January).
    pub fn month(&self) -> u8 {
        u8::from(self.0.month()) - 1
    }

    pub fn day(&self) -> u8 {
        self.0.day()
    }

    /// Weekday position in a Monday-first week (Monday = 0 … Sunday = 6).
    pub fn weekday_offset(&self) -> u8 {
        let raw = self.0.weekday().number_days_from_sunday();
        if raw == 0 {
            6
        } else {
            raw - 1
        }
    }

    pub fn add_days(&self, days: i64) -> Result<Self, DateError> {
        self.0
            .checked_add(Duration::days(days))
            .map(Self)
            .ok_or(DateError::OutOfRange)
    }

    pub fn is_same_month(&self, year: i32, month: u8) -> bool {
        self.year() == year && self.month() == month
    }

    pub fn key(&self) -> String {
        date_key(self)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.day(), self.0.month(), self.year())
    }
}

impl FromStr for CalendarDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_date_key(s)
    }
}

/// Canonical `YYYY-MM-DD` key used to index the event store. Negative years
/// carry the sign in front of the four padded digits.
pub fn date_key(date: &CalendarDate) -> String {
    let sign = if date.year() < 0 { "-" } else { "" };
    format!(
        "{sign}{:04}-{:02}-{:02}",
        date.year().unsigned_abs(),
        date.month() + 1,
        date.day()
    )
}

pub fn parse_date_key(key: &str) -> Result<CalendarDate, DateError> {
    let malformed = || DateError::MalformedKey(key.to_string());
    let mut parts = key.rsplitn(3, '-');
    let (Some(day), Some(month), Some(year)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed());
    };
    if month.len() != 2 || day.len() != 2 || year.trim_start_matches('-').len() < 4 {
        return Err(malformed());
    }
    let year: i32 = year.parse().map_err(|_| malformed())?;
    let month: u8 = month.parse().map_err(|_| malformed())?;
    let day: u8 = day.parse().map_err(|_| malformed())?;
    if month == 0 || month > 12 {
        return Err(malformed());
    }
    let date = CalendarDate::new(year, month - 1, day)?;
    // only the exact canonical spelling is a key
    if date_key(&date) != key {
        return Err(malformed());
    }
    Ok(date)
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Length of a month, taken as the day before the first of the next month.
pub fn days_in_month(year: i32, month: u8) -> Result<u8, DateError> {
    month_from_index(month)?;
    let (next_year, next_month) = shift_month(year, month, 1);
    let last = CalendarDate::first_of_month(next_year, next_month)?.add_days(-1)?;
    Ok(last.day())
}

/// Monday-first column of day 1 of the given month.
pub fn first_weekday_offset(year: i32, month: u8) -> Result<u8, DateError> {
    Ok(CalendarDate::first_of_month(year, month)?.weekday_offset())
}

/// Moves a zero-based (year, month) pair by `delta` months.
pub fn shift_month(year: i32, month: u8, delta: i32) -> (i32, u8) {
    let total = i64::from(year) * 12 + i64::from(month) + i64::from(delta);
    (total.div_euclid(12) as i32, total.rem_euclid(12) as u8)
}

pub fn month_name(month: u8) -> Result<String, DateError> {
    Ok(month_from_index(month)?.to_string())
}

fn month_from_index(month: u8) -> Result<Month, DateError> {
    if month > 11 {
        return Err(DateError::InvalidMonth(month));
    }
    Month::try_from(month + 1).map_err(|_| DateError::InvalidMonth(month))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn keys_are_zero_padded() -> anyhow::Result<()> {
        let date = CalendarDate::new(2024, 2, 5)?;
        assert_eq!(date_key(&date), "2024-03-05");
        assert_eq!(date.key(), "2024-03-05");
        Ok(())
    }

    #[test]
    fn keys_round_trip_across_a_leap_year() -> anyhow::Result<()> {
        let mut date = CalendarDate::new(2023, 11, 1)?;
        for _ in 0..800 {
            let parsed = parse_date_key(&date_key(&date))?;
            assert_eq!(parsed, date);
            date = date.add_days(1)?;
        }
        Ok(())
    }

    #[test]
    fn keys_round_trip_for_early_and_negative_years() -> anyhow::Result<()> {
        for (year, key) in [
            (-1, "-0001-01-01"),
            (-44, "-0044-01-01"),
            (-9999, "-9999-01-01"),
            (0, "0000-01-01"),
            (7, "0007-01-01"),
            (999, "0999-01-01"),
        ] {
            let date = CalendarDate::new(year, 0, 1)?;
            assert_eq!(date_key(&date), key);
            assert_eq!(parse_date_key(key)?, date);
        }

        let mut date = CalendarDate::new(-2, 10, 1)?;
        for _ in 0..800 {
            assert_eq!(parse_date_key(&date_key(&date))?, date);
            date = date.add_days(1)?;
        }
        Ok(())
    }

    #[test]
    fn parse_rejects_non_canonical_spellings() {
        for raw in ["+2024-03-05", " 2024-03-05", "2024-03-05\n", "02024-03-05", "-001-01-01"] {
            assert_matches!(parse_date_key(raw), Err(DateError::MalformedKey(_)));
        }
    }

    #[test]
    fn from_str_parses_keys() -> anyhow::Result<()> {
        let date: CalendarDate = "2024-03-05".parse()?;
        assert_eq!(date, CalendarDate::new(2024, 2, 5)?);
        assert!("2024/03/05".parse::<CalendarDate>().is_err());
        Ok(())
    }

    #[test]
    fn parse_rejects_malformed_keys() {
        for raw in ["", "2024-3-05", "2024-03", "abcd-01-02", "2024-13-01", "2024-00-10"] {
            assert_matches!(parse_date_key(raw), Err(DateError::MalformedKey(_)));
        }
        assert_matches!(
            parse_date_key("2023-02-29"),
            Err(DateError::InvalidDate { month: 2, day: 29, .. })
        );
    }

    #[test]
    fn normalized_rolls_months_and_days() -> anyhow::Result<()> {
        assert_eq!(
            CalendarDate::normalized(2024, -1, 15)?,
            CalendarDate::new(2023, 11, 15)?
        );
        assert_eq!(
            CalendarDate::normalized(2024, 12, 1)?,
            CalendarDate::new(2025, 0, 1)?
        );
        assert_eq!(
            CalendarDate::normalized(2024, 2, 0)?,
            CalendarDate::new(2024, 1, 29)?
        );
        assert_eq!(
            CalendarDate::normalized(2023, 1, 29)?,
            CalendarDate::new(2023, 2, 1)?
        );
        Ok(())
    }

    #[test]
    fn month_lengths_follow_leap_rules() -> anyhow::Result<()> {
        assert_eq!(days_in_month(2024, 1)?, 29);
        assert_eq!(days_in_month(2023, 1)?, 28);
        assert_eq!(days_in_month(1900, 1)?, 28);
        assert_eq!(days_in_month(2000, 1)?, 29);
        assert_eq!(days_in_month(2024, 3)?, 30);
        assert_eq!(days_in_month(2024, 11)?, 31);
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert_matches!(days_in_month(2024, 12), Err(DateError::InvalidMonth(12)));
        Ok(())
    }

    #[test]
    fn weekday_offset_starts_on_monday() -> anyhow::Result<()> {
        // 2024-03-01 is a Friday, 2024-09-01 a Sunday, 2024-01-01 a Monday.
        assert_eq!(first_weekday_offset(2024, 2)?, 4);
        assert_eq!(first_weekday_offset(2024, 8)?, 6);
        assert_eq!(first_weekday_offset(2024, 0)?, 0);
        Ok(())
    }

    #[test]
    fn shift_month_wraps_years() {
        assert_eq!(shift_month(2024, 0, -1), (2023, 11));
        assert_eq!(shift_month(2024, 11, 1), (2025, 0));
        assert_eq!(shift_month(2024, 5, -18), (2022, 11));
        assert_eq!(shift_month(2024, 5, 0), (2024, 5));
    }

    #[test]
    fn display_uses_long_form() -> anyhow::Result<()> {
        assert_eq!(CalendarDate::new(2024, 2, 5)?.to_string(), "5 March 2024");
        Ok(())
    }
}
