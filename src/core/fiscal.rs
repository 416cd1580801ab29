//! Fiscal year windows.
//!
//! A fiscal year runs from April 1 of one calendar year through March 31 of
//! the next. Invoice numbering and duplicate detection are scoped to it.

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// Month in which a fiscal year starts
const FISCAL_YEAR_START_MONTH: u32 = 4;

/// A fiscal year identified by the calendar year it starts in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FiscalYear {
    /// Calendar year of the April 1 that opens the window
    pub start_year: i32,
}

impl FiscalYear {
    /// The fiscal year that contains `date`
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        let start_year = if date.month() >= FISCAL_YEAR_START_MONTH {
            date.year()
        } else {
            date.year() - 1
        };
        Self { start_year }
    }

    /// First day of the window (April 1)
    #[must_use]
    pub fn start(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start_year, FISCAL_YEAR_START_MONTH, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the window (March 31 of the following year)
    #[must_use]
    pub fn end(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start_year + 1, 3, 31).unwrap_or(NaiveDate::MAX)
    }

    /// Whether `date` falls inside the window
    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        (self.start()..=self.end()).contains(&date)
    }
}

impl fmt::Display for FiscalYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:02}",
            self.start_year,
            (self.start_year + 1).rem_euclid(100)
        )
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_containing_after_april() {
        let fy = FiscalYear::containing(date(2023, 5, 15));
        assert_eq!(fy.start_year, 2023);
        assert_eq!(fy.start(), date(2023, 4, 1));
        assert_eq!(fy.end(), date(2024, 3, 31));
    }

    #[test]
    fn test_containing_before_april() {
        assert_eq!(FiscalYear::containing(date(2024, 3, 31)).start_year, 2023);
        assert_eq!(FiscalYear::containing(date(2024, 1, 1)).start_year, 2023);
        assert_eq!(FiscalYear::containing(date(2024, 4, 1)).start_year, 2024);
    }

    #[test]
    fn test_contains() {
        let fy = FiscalYear { start_year: 2023 };
        assert!(fy.contains(date(2023, 4, 1)));
        assert!(fy.contains(date(2024, 3, 31)));
        assert!(!fy.contains(date(2023, 3, 31)));
        assert!(!fy.contains(date(2024, 4, 1)));
    }

    #[test]
    fn test_label() {
        assert_eq!(FiscalYear { start_year: 2023 }.to_string(), "2023-24");
        assert_eq!(FiscalYear { start_year: 1999 }.to_string(), "1999-00");
    }
}
