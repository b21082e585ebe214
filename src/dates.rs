//! Calendar helpers and capture-date tokens for the archive service.

use std::fmt;

use chrono::{Days, NaiveDate};

use crate::error::{Error, Result};

/// Date formats accepted for date cells and configuration values.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%d/%m/%Y"];

/// Parses a date in any of the accepted formats.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| Error::Parse(format!("unrecognised date '{trimmed}'")))
}

/// Fails with [`Error::Range`] unless `start <= end`.
pub fn check_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(Error::Range(format!("start {start} is after end {end}")));
    }
    Ok(())
}

/// Iterates every calendar day of `[start, end]` in ascending order.
///
/// Callers validate the range first; an inverted range yields nothing.
pub fn days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> + Clone {
    start.iter_days().take_while(move |d| *d <= end)
}

/// A capture date in the archive's `YYYYMMDD` token format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaptureToken(NaiveDate);

impl CaptureToken {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for CaptureToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y%m%d"))
    }
}

/// An inclusive, validated range of capture dates.
///
/// The range itself holds no tokens; each call to [`CaptureDates::iter`]
/// starts a fresh lazy walk from `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureDates {
    start: NaiveDate,
    end: NaiveDate,
}

impl CaptureDates {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        check_range(start, end)?;
        Ok(Self { start, end })
    }

    /// Builds a range from two date strings, e.g. `"2020-06-15"`.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days in the range, both ends included.
    pub fn len(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> CaptureIter {
        CaptureIter {
            next: Some(self.start),
            end: self.end,
        }
    }
}

impl IntoIterator for &CaptureDates {
    type Item = CaptureToken;
    type IntoIter = CaptureIter;

    fn into_iter(self) -> CaptureIter {
        self.iter()
    }
}

/// Lazy iterator over the tokens of a [`CaptureDates`] range.
#[derive(Debug, Clone)]
pub struct CaptureIter {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for CaptureIter {
    type Item = CaptureToken;

    fn next(&mut self) -> Option<CaptureToken> {
        let current = self.next?;
        self.next = if current < self.end {
            current.checked_add_days(Days::new(1))
        } else {
            None
        };
        Some(CaptureToken(current))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self
            .next
            .map(|d| (self.end - d).num_days() as usize + 1)
            .unwrap_or(0);
        (n, Some(n))
    }
}

impl ExactSizeIterator for CaptureIter {}
