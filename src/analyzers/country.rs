use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::analyzers::align::restrict_to_range;
use crate::analyzers::types::CountryTotal;
use crate::analyzers::utility::calculate_percentage;
use crate::error::{Error, Result};
use crate::frame::Frame;

/// Sums tests per country over `[start, end]`, largest total first.
///
/// `country_level` names the index level holding the country.
pub fn country_totals(
    frame: &Frame,
    start: NaiveDate,
    end: NaiveDate,
    country_level: &str,
    total_col: &str,
    positive_col: &str,
) -> Result<Vec<CountryTotal>> {
    let level = frame
        .level_index(country_level)
        .ok_or_else(|| Error::Config(format!("index level '{country_level}' not found")))?;
    let total_idx = frame
        .column_index(total_col)
        .ok_or_else(|| Error::Config(format!("column '{total_col}' not found")))?;
    let positive_idx = frame
        .column_index(positive_col)
        .ok_or_else(|| Error::Config(format!("column '{positive_col}' not found")))?;

    let in_range = restrict_to_range(frame, start, end)?;

    let mut sums: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for row in in_range.rows() {
        let entry = sums.entry(row.key.dims[level].as_str()).or_default();
        entry.0 += row.values[total_idx].unwrap_or(0.0);
        entry.1 += row.values[positive_idx].unwrap_or(0.0);
    }

    let mut totals: Vec<CountryTotal> = sums
        .into_iter()
        .map(|(country, (total, positive))| CountryTotal {
            country: country.to_string(),
            total_tests: total,
            positive_tests: positive,
            positive_percentage: calculate_percentage(positive, total),
        })
        .collect();
    totals.sort_by(|a, b| b.total_tests.total_cmp(&a.total_tests));

    Ok(totals)
}
