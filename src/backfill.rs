//! Range backfill: fetch, locate and extract one archived table per day.
//!
//! Dates are processed strictly in order, one request at a time. A date that
//! fails never aborts the range unless [`FailurePolicy::FailFast`] is chosen;
//! every date ends up in [`BackfillResult::report`] with its outcome.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::dates::{CaptureDates, CaptureToken};
use crate::error::{Error, Result};
use crate::fetch::{HttpClient, Wayback};
use crate::frame::{DatedTable, RawTable};
use crate::parser::{extract_table, locate_table, parse_page};

/// What to do when a snapshot cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Record the failure and move on to the next date.
    #[default]
    Continue,
    /// Stop at the first fetch failure and return it.
    FailFast,
}

/// Shared flag a caller sets to stop a running backfill.
///
/// Checked before every fetch; dates already extracted are kept.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BackfillOptions {
    pub policy: FailurePolicy,
    pub cancel: CancelFlag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum DateOutcome {
    Extracted { rows: usize },
    NotFound,
    FetchFailed(String),
    ParseFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateReport {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub outcome: DateOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BackfillResult {
    /// Extracted tables in date order.
    #[serde(skip)]
    pub tables: Vec<DatedTable>,
    /// One entry per processed date.
    pub report: Vec<DateReport>,
    pub cancelled: bool,
}

impl BackfillResult {
    /// All extracted tables stacked into one.
    pub fn concat(&self) -> RawTable {
        RawTable::concat(self.tables.iter().map(DatedTable::table))
    }

    pub fn not_found(&self) -> Vec<NaiveDate> {
        self.dates_where(|o| matches!(o, DateOutcome::NotFound))
    }

    pub fn failed(&self) -> Vec<NaiveDate> {
        self.dates_where(|o| matches!(o, DateOutcome::FetchFailed(_) | DateOutcome::ParseFailed(_)))
    }

    fn dates_where(&self, pred: impl Fn(&DateOutcome) -> bool) -> Vec<NaiveDate> {
        self.report
            .iter()
            .filter(|r| pred(&r.outcome))
            .map(|r| r.date)
            .collect()
    }
}

/// Fetches one capture and extracts the captioned table.
///
/// `Ok(None)` means the capture has no matching caption.
pub fn scrape_date<C: HttpClient>(
    fetcher: &Wayback<C>,
    token: &CaptureToken,
    caption: &str,
) -> Result<Option<DatedTable>> {
    let content = fetcher.fetch(token)?;
    let page = parse_page(&content);
    match locate_table(&page, caption) {
        Some(fragment) => extract_table(&fragment, token.date()).map(Some),
        None => Ok(None),
    }
}

/// Runs [`scrape_date`] for every date of `dates`.
///
/// Under [`FailurePolicy::FailFast`] the tables extracted before the failing
/// date are dropped with the result; use [`backfill_into`] to keep them.
pub fn backfill<C: HttpClient>(
    fetcher: &Wayback<C>,
    dates: &CaptureDates,
    caption: &str,
    options: &BackfillOptions,
) -> Result<BackfillResult> {
    let mut result = BackfillResult::default();
    backfill_into(fetcher, dates, caption, options, &mut result)?;
    Ok(result)
}

/// Same as [`backfill`], accumulating into `result`.
///
/// When a fail-fast error is returned, `result` still holds every table
/// extracted so far and the failing date is reported as `FetchFailed`.
#[tracing::instrument(
    skip(fetcher, dates, options, result),
    fields(
        url = %fetcher.target_url(),
        start = %dates.start(),
        end = %dates.end(),
        policy = ?options.policy
    )
)]
pub fn backfill_into<C: HttpClient>(
    fetcher: &Wayback<C>,
    dates: &CaptureDates,
    caption: &str,
    options: &BackfillOptions,
    result: &mut BackfillResult,
) -> Result<()> {
    info!(days = dates.len(), "Starting backfill");

    for token in dates {
        if options.cancel.is_cancelled() {
            warn!(next = %token, "Backfill cancelled");
            result.cancelled = true;
            break;
        }

        let span = tracing::info_span!("capture", token = %token);
        let _guard = span.enter();

        let outcome = match scrape_date(fetcher, &token, caption) {
            Ok(Some(table)) => {
                let rows = table.table().len();
                info!(rows, "Table extracted");
                result.tables.push(table);
                DateOutcome::Extracted { rows }
            }
            Ok(None) => {
                warn!(caption, "Caption not found");
                DateOutcome::NotFound
            }
            Err(e @ Error::Fetch { .. }) => {
                error!(error = %e, "Snapshot fetch failed");
                result.report.push(DateReport {
                    date: token.date(),
                    outcome: DateOutcome::FetchFailed(e.to_string()),
                });
                if options.policy == FailurePolicy::FailFast {
                    warn!(extracted = result.tables.len(), "Stopping at first fetch failure");
                    return Err(e);
                }
                continue;
            }
            Err(e) => {
                error!(error = %e, "Table extraction failed");
                DateOutcome::ParseFailed(e.to_string())
            }
        };

        result.report.push(DateReport {
            date: token.date(),
            outcome,
        });
    }

    info!(
        extracted = result.tables.len(),
        not_found = result.not_found().len(),
        failed = result.failed().len(),
        cancelled = result.cancelled,
        "Backfill finished"
    );
    Ok(())
}
