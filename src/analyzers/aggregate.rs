use std::collections::BTreeMap;

use tracing::debug;

use crate::analyzers::align::align;
use crate::analyzers::month::MonthBucket;
use crate::analyzers::types::{POSITIVE_TESTS, Period, SeriesRow, SeriesTable, TOTAL_TESTS};
use crate::analyzers::utility::calculate_percentage;
use crate::config::SeriesConfig;
use crate::error::{Error, Result};
use crate::frame::Frame;

/// Aligns `frame` to the configured range and renames its measures to the
/// canonical `Total tests` / `Positive tests`, then either passes the days
/// through or rolls them up by month.
///
/// Monthly groups are ordered by month first, then by the remaining index
/// values, whatever order the input rows came in. Each group sums every
/// numeric column and gets a `positive percentage`.
pub fn preprocess(frame: &Frame, config: &SeriesConfig) -> Result<SeriesTable> {
    config.validate()?;

    let aligned = align(frame, config.date_start, config.date_end)?;
    let renamed = aligned.rename_columns(&[
        (config.total_col.as_str(), TOTAL_TESTS),
        (config.positive_col.as_str(), POSITIVE_TESTS),
    ])?;

    let total_idx = renamed
        .column_index(TOTAL_TESTS)
        .ok_or_else(|| Error::Config(format!("column '{TOTAL_TESTS}' not found")))?;
    let positive_idx = renamed
        .column_index(POSITIVE_TESTS)
        .ok_or_else(|| Error::Config(format!("column '{POSITIVE_TESTS}' not found")))?;
    let extra_idx: Vec<usize> = (0..renamed.columns().len())
        .filter(|&i| i != total_idx && i != positive_idx)
        .collect();

    let rows = if config.groupby_monthly {
        monthly_rows(&renamed, total_idx, positive_idx, &extra_idx)
    } else {
        renamed
            .rows()
            .iter()
            .map(|row| SeriesRow {
                period: Period::Day(row.key.date),
                dims: row.key.dims.clone(),
                total_tests: row.values[total_idx],
                positive_tests: row.values[positive_idx],
                extra: extra_idx.iter().map(|&i| row.values[i]).collect(),
                positive_percentage: None,
            })
            .collect()
    };

    debug!(
        rows = rows.len(),
        monthly = config.groupby_monthly,
        country = config.country.as_deref().unwrap_or(""),
        "Series preprocessed"
    );

    Ok(SeriesTable {
        levels: renamed.levels().to_vec(),
        extra_columns: extra_idx.iter().map(|&i| renamed.columns()[i].clone()).collect(),
        country: config.country.clone(),
        monthly: config.groupby_monthly,
        rows,
    })
}

fn monthly_rows(
    frame: &Frame,
    total_idx: usize,
    positive_idx: usize,
    extra_idx: &[usize],
) -> Vec<SeriesRow> {
    let width = frame.columns().len();
    let mut groups: BTreeMap<(MonthBucket, Vec<String>), Vec<f64>> = BTreeMap::new();

    for row in frame.rows() {
        let key = (MonthBucket::of(row.key.date), row.key.dims.clone());
        let sums = groups.entry(key).or_insert_with(|| vec![0.0; width]);
        for (acc, value) in sums.iter_mut().zip(&row.values) {
            *acc += value.unwrap_or(0.0);
        }
    }

    groups
        .into_iter()
        .map(|((month, dims), sums)| SeriesRow {
            period: Period::Month(month),
            dims,
            total_tests: Some(sums[total_idx]),
            positive_tests: Some(sums[positive_idx]),
            extra: extra_idx.iter().map(|&i| Some(sums[i])).collect(),
            positive_percentage: Some(calculate_percentage(sums[positive_idx], sums[total_idx])),
        })
        .collect()
}
