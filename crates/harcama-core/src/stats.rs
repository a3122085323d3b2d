//! Calendar-month arithmetic for statistics and limits
//!
//! Months are keyed as `YYYY-MM`, matching the prefix of stored dates.

use chrono::{Datelike, NaiveDate};

use crate::error::{Error, Result};
use crate::models::round_money;

/// Default window for monthly and trend reports
pub const DEFAULT_MONTHS: u32 = 6;

/// Upper bound on report windows
pub const MAX_MONTHS: u32 = 60;

/// Complete months averaged for predictions
pub const PREDICTION_WINDOW: u32 = 3;

/// A calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parse `YYYY-MM`
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidData(format!("Invalid month '{}', expected YYYY-MM", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }

    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// This month shifted by `delta` months
    pub fn offset(&self, delta: i32) -> Self {
        let index = self.year * 12 + self.month as i32 - 1 + delta;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn last_day(&self) -> NaiveDate {
        self.offset(1)
            .first_day()
            .pred_opt()
            .unwrap_or_else(|| self.first_day())
    }

    pub fn days(&self) -> u32 {
        self.last_day().day()
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// The `count` months ending with (and including) `last`, oldest first
pub fn months_ending(last: Month, count: u32) -> Vec<Month> {
    let count = count.clamp(1, MAX_MONTHS) as i32;
    (0..count).rev().map(|back| last.offset(-back)).collect()
}

/// Percent change from `previous` to `current`; None without a base
pub fn change_percentage(previous: f64, current: f64) -> Option<f64> {
    if previous <= 0.0 {
        return None;
    }
    Some(round_money((current - previous) / previous * 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_parse() {
        assert_eq!(
            Month::parse("2024-03").unwrap(),
            Month {
                year: 2024,
                month: 3
            }
        );
        assert!(Month::parse("2024-13").is_err());
        assert!(Month::parse("2024-3").is_err());
        assert!(Month::parse("March").is_err());
    }

    #[test]
    fn test_month_offset_across_years() {
        let jan = Month::parse("2024-01").unwrap();
        assert_eq!(jan.offset(-1).key(), "2023-12");
        assert_eq!(jan.offset(12).key(), "2025-01");
        assert_eq!(jan.offset(-13).key(), "2022-12");
    }

    #[test]
    fn test_month_bounds() {
        let feb = Month::parse("2024-02").unwrap();
        assert_eq!(feb.first_day(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(feb.days(), 29);
        assert_eq!(Month::parse("2023-12").unwrap().days(), 31);
    }

    #[test]
    fn test_months_ending() {
        let keys: Vec<_> = months_ending(Month::parse("2024-02").unwrap(), 3)
            .iter()
            .map(Month::key)
            .collect();
        assert_eq!(keys, ["2023-12", "2024-01", "2024-02"]);
        assert_eq!(months_ending(Month::parse("2024-02").unwrap(), 0).len(), 1);
    }

    #[test]
    fn test_change_percentage() {
        assert_eq!(change_percentage(100.0, 150.0), Some(50.0));
        assert_eq!(change_percentage(200.0, 50.0), Some(-75.0));
        assert_eq!(change_percentage(0.0, 50.0), None);
    }
}
