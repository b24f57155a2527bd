use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Deserialize};

use crate::error::{Result, SchedulerError};

/// Day names indexed by weekday number (0 = Sunday)
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
];

/// A validated (month, year) pair with its calendar facts precomputed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "MonthRef", into = "MonthRef")]
pub struct MonthKey {
    month: u32,
    year: i32,
    first_weekday: u32,
    days: u32,
}

/// Plain wire form of a month
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MonthRef {
    pub month: u32,
    pub year: i32,
}

impl MonthKey {
    pub fn new(month: u32, year: i32) -> Result<MonthKey> {
        if !(1..=9999).contains(&year) {
            return Err(SchedulerError::InvalidMonth { month, year });
        }
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(SchedulerError::InvalidMonth { month, year })?;
        let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
        let days = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .map(|next| next.signed_duration_since(first).num_days() as u32)
            .unwrap_or(31);

        Ok(MonthKey {
            month,
            year,
            first_weekday: first.weekday().num_days_from_sunday(),
            days,
        })
    }

    /// Builds a month from a possibly out-of-range month number, rolling the year
    /// (month 0 is December of the previous year, 13 is January of the next).
    pub fn rolled(year: i32, month: i32) -> Result<MonthKey> {
        let zero_based = month - 1;
        let year = year + zero_based.div_euclid(12);
        let month = zero_based.rem_euclid(12) as u32 + 1;
        MonthKey::new(month, year)
    }

    pub fn current() -> MonthKey {
        let today = chrono::Local::now().date_naive();
        MonthKey::new(today.month(), today.year())
            .unwrap_or(MonthKey { month: 1, year: 2000, first_weekday: 6, days: 31 })
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn days_in_month(&self) -> u32 {
        self.days
    }

    pub fn contains_day(&self, day: u32) -> bool {
        day >= 1 && day <= self.days
    }

    pub fn previous(&self) -> Result<MonthKey> {
        MonthKey::rolled(self.year, self.month as i32 - 1)
    }

    pub fn next(&self) -> Result<MonthKey> {
        MonthKey::rolled(self.year, self.month as i32 + 1)
    }

    /// Weekday of `day` (0 = Sunday). Days outside the month count on from the
    /// first, so day 0 is the last day of the previous month.
    pub fn weekday_of(&self, day: i32) -> u32 {
        (self.first_weekday as i32 + day - 1).rem_euclid(7) as u32
    }

    /// Sunday starting the calendar week that contains `day`; may be zero or negative
    pub fn week_start(&self, day: u32) -> i32 {
        day as i32 - self.weekday_of(day as i32) as i32
    }

    pub fn label(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_else(|| format!("{}/{}", self.month, self.year))
    }
}

impl TryFrom<MonthRef> for MonthKey {
    type Error = SchedulerError;

    fn try_from(value: MonthRef) -> Result<Self> {
        MonthKey::new(value.month, value.year)
    }
}

impl From<MonthKey> for MonthRef {
    fn from(key: MonthKey) -> Self {
        MonthRef { month: key.month, year: key.year }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_of_matches_chrono() {
        // 1 March 2024 was a Friday
        let march = MonthKey::new(3, 2024).unwrap();
        assert_eq!(march.weekday_of(1), 5);
        assert_eq!(march.weekday_of(3), 0);
        assert_eq!(march.days_in_month(), 31);
    }

    #[test]
    fn weekday_of_handles_days_outside_the_month() {
        let march = MonthKey::new(3, 2024).unwrap();
        // 29 February 2024 was a Thursday
        assert_eq!(march.weekday_of(0), 4);
        assert_eq!(march.weekday_of(-6), 5);
    }

    #[test]
    fn rolled_crosses_year_boundaries() {
        let dec = MonthKey::rolled(2024, 0).unwrap();
        assert_eq!((dec.month(), dec.year()), (12, 2023));
        let jan = MonthKey::rolled(2024, 13).unwrap();
        assert_eq!((jan.month(), jan.year()), (1, 2025));
        let jan_prev = MonthKey::new(1, 2025).unwrap().previous().unwrap();
        assert_eq!((jan_prev.month(), jan_prev.year()), (12, 2024));
    }

    #[test]
    fn february_lengths() {
        assert_eq!(MonthKey::new(2, 2024).unwrap().days_in_month(), 29);
        assert_eq!(MonthKey::new(2, 2023).unwrap().days_in_month(), 28);
    }

    #[test]
    fn invalid_months_are_rejected() {
        assert!(MonthKey::new(0, 2024).is_err());
        assert!(MonthKey::new(13, 2024).is_err());
    }

    #[test]
    fn week_start_can_precede_the_month() {
        // November 2023 starts on a Wednesday
        let nov = MonthKey::new(11, 2023).unwrap();
        assert_eq!(nov.week_start(3), -2);
        assert_eq!(nov.week_start(5), 5);
    }
}
