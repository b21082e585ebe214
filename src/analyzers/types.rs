//! Output types of the normalization pipeline.

use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::analyzers::month::MonthBucket;

pub const TOTAL_TESTS: &str = "Total tests";
pub const POSITIVE_TESTS: &str = "Positive tests";
pub const POSITIVE_PERCENTAGE: &str = "positive percentage";
pub const DATE: &str = "Date";
pub const MONTH: &str = "Month";
pub const COUNTRY: &str = "Country";

/// Share of positive tests, or a marker when no tests were recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Percentage {
    Value(f64),
    NoData,
}

impl Percentage {
    pub fn value(&self) -> Option<f64> {
        match self {
            Percentage::Value(v) => Some(*v),
            Percentage::NoData => None,
        }
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Percentage::Value(v) => write!(f, "{v:.2}"),
            Percentage::NoData => write!(f, "no data"),
        }
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Percentage::Value(v) => serializer.serialize_f64(*v),
            Percentage::NoData => serializer.serialize_str("no data"),
        }
    }
}

/// Row label: a calendar day, or a month after monthly grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Period {
    Day(NaiveDate),
    Month(MonthBucket),
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Period::Month(month) => write!(f, "{month}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRow {
    pub period: Period,
    pub dims: Vec<String>,
    pub total_tests: Option<f64>,
    pub positive_tests: Option<f64>,
    /// Values of the carried-through columns, in `SeriesTable::extra_columns` order.
    pub extra: Vec<Option<f64>>,
    /// Only computed by monthly grouping.
    pub positive_percentage: Option<Percentage>,
}

/// Normalized series with canonical column names.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesTable {
    pub levels: Vec<String>,
    pub extra_columns: Vec<String>,
    pub country: Option<String>,
    pub monthly: bool,
    pub rows: Vec<SeriesRow>,
}

impl SeriesTable {
    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec![if self.monthly { MONTH } else { DATE }.to_string()];
        headers.extend(self.levels.iter().cloned());
        headers.push(TOTAL_TESTS.to_string());
        headers.push(POSITIVE_TESTS.to_string());
        headers.extend(self.extra_columns.iter().cloned());
        if self.monthly {
            headers.push(POSITIVE_PERCENTAGE.to_string());
        }
        if self.country.is_some() {
            headers.push(COUNTRY.to_string());
        }
        headers
    }

    /// Rows rendered as text in [`SeriesTable::headers`] order; missing values are empty.
    pub fn records(&self) -> Vec<Vec<String>> {
        let num = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        self.rows
            .iter()
            .map(|row| {
                let mut record = vec![row.period.to_string()];
                record.extend(row.dims.iter().cloned());
                record.push(num(row.total_tests));
                record.push(num(row.positive_tests));
                record.extend(row.extra.iter().map(|v| num(*v)));
                if self.monthly {
                    record.push(
                        row.positive_percentage
                            .map(|p| p.to_string())
                            .unwrap_or_default(),
                    );
                }
                if let Some(country) = &self.country {
                    record.push(country.clone());
                }
                record
            })
            .collect()
    }

    pub fn total_tests(&self) -> f64 {
        self.rows.iter().filter_map(|r| r.total_tests).sum()
    }
}

/// One 2-week window of the incidence series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidenceRecord {
    pub window_end: NaiveDate,
    pub positive: Option<f64>,
    pub incidence: Option<f64>,
}

/// Totals for one country over a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryTotal {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Total tests")]
    pub total_tests: f64,
    #[serde(rename = "Positive tests")]
    pub positive_tests: f64,
    #[serde(rename = "positive percentage")]
    pub positive_percentage: Percentage,
}
