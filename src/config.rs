//! Explicit configuration for the normalization pipeline and the archive client.

use std::time::Duration;

use chrono::NaiveDate;

use crate::analyzers::types::{POSITIVE_TESTS, TOTAL_TESTS};
use crate::dates::{check_range, parse_date};
use crate::error::{Error, Result};

pub const DEFAULT_ARCHIVE_BASE: &str = "http://web.archive.org/web";

/// Options recognised by [`crate::analyzers::aggregate::preprocess`].
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesConfig {
    /// Source column holding the total number of tests.
    pub total_col: String,
    /// Source column holding the number of positive tests.
    pub positive_col: String,
    /// Country stamped on every output row, if any.
    pub country: Option<String>,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub groupby_monthly: bool,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            total_col: TOTAL_TESTS.to_string(),
            positive_col: POSITIVE_TESTS.to_string(),
            country: None,
            date_start: NaiveDate::from_ymd_opt(2020, 6, 15).unwrap_or_default(),
            date_end: NaiveDate::from_ymd_opt(2022, 3, 14).unwrap_or_default(),
            groupby_monthly: false,
        }
    }
}

impl SeriesConfig {
    pub fn with_columns(mut self, total_col: &str, positive_col: &str) -> Self {
        self.total_col = total_col.to_string();
        self.positive_col = positive_col.to_string();
        self
    }

    pub fn with_country(mut self, country: &str) -> Self {
        self.country = Some(country.to_string());
        self
    }

    pub fn with_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_start = start;
        self.date_end = end;
        self
    }

    /// Same as [`SeriesConfig::with_range`] but from `YYYY-MM-DD` strings.
    pub fn with_range_str(self, start: &str, end: &str) -> Result<Self> {
        Ok(self.with_range(parse_date(start)?, parse_date(end)?))
    }

    pub fn monthly(mut self, monthly: bool) -> Self {
        self.groupby_monthly = monthly;
        self
    }

    /// Checks the range and the column mapping.
    pub fn validate(&self) -> Result<()> {
        check_range(self.date_start, self.date_end)?;
        if self.total_col.trim().is_empty() || self.positive_col.trim().is_empty() {
            return Err(Error::Config("measure column names must not be empty".into()));
        }
        if self.total_col == self.positive_col {
            return Err(Error::Config(format!(
                "total and positive columns both map to '{}'",
                self.total_col
            )));
        }
        Ok(())
    }
}

/// Settings for the blocking archive client.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ARCHIVE_BASE.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("covid_series/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ArchiveConfig {
    /// Defaults overridden by `ARCHIVE_BASE_URL`, `ARCHIVE_TIMEOUT_SECS` and
    /// `ARCHIVE_USER_AGENT` when set.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Like [`ArchiveConfig::from_env`], reading variables through `lookup`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(base) = lookup("ARCHIVE_BASE_URL") {
            config.base_url = base.trim_end_matches('/').to_string();
        }
        if let Some(secs) = lookup("ARCHIVE_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::Config(format!("ARCHIVE_TIMEOUT_SECS is not a number: '{secs}'"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(agent) = lookup("ARCHIVE_USER_AGENT") {
            config.user_agent = agent;
        }

        Ok(config)
    }
}
