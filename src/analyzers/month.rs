//! Calendar-month buckets used by monthly grouping.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// A calendar month, ordered chronologically.
///
/// Field order makes the derived `Ord` equal to ordering by `year * 12 + month`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthBucket {
    year: i32,
    month: u32,
}

impl MonthBucket {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::Config(format!("month {month} out of range")));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Chronological sort key.
    pub fn key(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    pub fn first_day(&self) -> NaiveDate {
        // month is validated on construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }
}

impl fmt::Display for MonthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first_day().format("%b-%Y"))
    }
}

impl FromStr for MonthBucket {
    type Err = Error;

    /// Parses labels such as `Jun-2020`.
    fn from_str(s: &str) -> Result<Self> {
        NaiveDate::parse_from_str(&format!("01-{}", s.trim()), "%d-%b-%Y")
            .map(Self::of)
            .map_err(|_| Error::Parse(format!("invalid month label '{s}'")))
    }
}

impl Serialize for MonthBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
