//! ISO week keys used to window workouts and to key showdowns.
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One ISO-8601 week (Monday through Sunday, UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekKey {
    year: i32,
    week: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WeekKeyParseError {
    #[error("week key must look like 2026-W07 (got {0:?})")]
    Format(String),
    #[error("week {week} does not exist in ISO year {year}")]
    OutOfRange { year: i32, week: u32 },
}

impl WeekKey {
    /// Build a key, rejecting weeks that the ISO calendar does not contain.
    ///
    /// # Errors
    ///
    /// Returns [`WeekKeyParseError::OutOfRange`] for week 0, week 54+, or
    /// week 53 in a 52-week year.
    pub fn new(year: i32, week: u32) -> Result<Self, WeekKeyParseError> {
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
            .map(|_| Self { year, week })
            .ok_or(WeekKeyParseError::OutOfRange { year, week })
    }

    /// The ISO week containing `at`.
    #[must_use]
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        let iso = at.date_naive().iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    #[must_use]
    pub const fn week(self) -> u32 {
        self.week
    }

    /// Monday of this week.
    #[must_use]
    pub fn monday(self) -> NaiveDate {
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon).unwrap_or(NaiveDate::MIN)
    }

    /// Inclusive start of the week, Monday 00:00 UTC.
    #[must_use]
    pub fn start(self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.monday().and_time(NaiveTime::MIN))
    }

    /// Exclusive end of the week, the following Monday 00:00 UTC.
    #[must_use]
    pub fn end(self) -> DateTime<Utc> {
        self.start() + Duration::weeks(1)
    }

    #[must_use]
    pub fn contains(self, at: DateTime<Utc>) -> bool {
        at >= self.start() && at < self.end()
    }

    #[must_use]
    pub fn previous(self) -> Self {
        Self::from_datetime(self.start() - Duration::days(1))
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self::from_datetime(self.end())
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

impl FromStr for WeekKey {
    type Err = WeekKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let format_err = || WeekKeyParseError::Format(trimmed.to_string());
        let (year, week) = trimmed.split_once("-W").ok_or_else(format_err)?;
        let year: i32 = year.parse().map_err(|_| format_err())?;
        let week: u32 = week.parse().map_err(|_| format_err())?;
        Self::new(year, week)
    }
}

impl TryFrom<String> for WeekKey {
    type Error = WeekKeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WeekKey> for String {
    fn from(value: WeekKey) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn display_and_parse_agree() {
        let key = WeekKey::new(2026, 7).unwrap();
        assert_eq!(key.to_string(), "2026-W07");
        assert_eq!("2026-W07".parse::<WeekKey>().unwrap(), key);
    }

    #[test]
    fn rejects_malformed_and_missing_weeks() {
        assert!(matches!(
            "2026/07".parse::<WeekKey>(),
            Err(WeekKeyParseError::Format(_))
        ));
        assert_eq!(
            WeekKey::new(2026, 0),
            Err(WeekKeyParseError::OutOfRange { year: 2026, week: 0 })
        );
        assert!(WeekKey::new(2026, 54).is_err());
        assert!(WeekKey::new(2020, 53).is_ok());
    }

    #[test]
    fn windows_run_monday_to_monday() {
        // 2026-10-14 is a Wednesday.
        let key = WeekKey::from_datetime(at(2026, 10, 14, 9));
        assert_eq!(key.start(), at(2026, 10, 12, 0));
        assert_eq!(key.end(), at(2026, 10, 19, 0));
        assert!(key.contains(at(2026, 10, 18, 23)));
        assert!(!key.contains(at(2026, 10, 19, 0)));
    }

    #[test]
    fn previous_and_next_cross_year_boundaries() {
        let first = WeekKey::new(2026, 1).unwrap();
        let prev = first.previous();
        assert_eq!(prev, WeekKey::new(2025, 52).unwrap());
        assert_eq!(prev.next(), first);
    }

    #[test]
    fn serializes_as_string() {
        let key = WeekKey::new(2026, 42).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"2026-W42\"");
        let back: WeekKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
