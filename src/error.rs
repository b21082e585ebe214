//! Error type shared by the normalization and extraction pipelines.

use chrono::NaiveDate;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid date range: {0}")]
    Range(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to fetch snapshot {token} of {url}: {reason}")]
    Fetch {
        token: String,
        url: String,
        reason: String,
    },

    #[error("No parseable table: {0}")]
    Parse(String),

    #[error("Duplicate index key: {date} {dims:?}")]
    DuplicateKey { date: NaiveDate, dims: Vec<String> },
}

pub type Result<T> = std::result::Result<T, Error>;
