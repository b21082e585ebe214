//! Two-week incidence per 100,000 inhabitants.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::analyzers::types::IncidenceRecord;
use crate::analyzers::utility::{mean, round2};
use crate::error::{Error, Result};
use crate::frame::Frame;

/// Column the resampler reads case counts from.
pub const POSITIVE_COLUMN: &str = "positive";

pub const WINDOW_DAYS: u64 = 14;

/// Windows end on this weekday.
pub const WINDOW_ANCHOR: Weekday = Weekday::Sun;

/// Resamples the `positive` column of a daily frame into 2-week windows.
///
/// The frame must be indexed by date only.
pub fn resample_incidence(frame: &Frame, population: i64) -> Result<Vec<IncidenceRecord>> {
    if !frame.levels().is_empty() {
        return Err(Error::Config(format!(
            "incidence needs a date-only index, frame has levels {:?}",
            frame.levels()
        )));
    }
    let values = frame
        .column(POSITIVE_COLUMN)
        .ok_or_else(|| Error::Config(format!("column '{POSITIVE_COLUMN}' not found")))?;

    let points: Vec<(NaiveDate, Option<f64>)> = frame
        .rows()
        .iter()
        .zip(values)
        .map(|(r, v)| (r.key.date, v))
        .collect();
    resample_series(&points, population)
}

/// Averages `points` over consecutive 14-day windows closed on the right.
///
/// The first window ends on the first Sunday on or after the earliest date;
/// the last one contains the latest date. A window with no values yields
/// `None` for both the mean and the incidence.
pub fn resample_series(
    points: &[(NaiveDate, Option<f64>)],
    population: i64,
) -> Result<Vec<IncidenceRecord>> {
    if population <= 0 {
        return Err(Error::Config(format!("population must be positive, got {population}")));
    }

    let (Some(first), Some(last)) = (
        points.iter().map(|(d, _)| *d).min(),
        points.iter().map(|(d, _)| *d).max(),
    ) else {
        return Ok(Vec::new());
    };

    let first_end = first_window_end(first)?;
    let window_of = |date: NaiveDate| -> usize {
        let behind = (date - first_end).num_days();
        if behind <= 0 {
            0
        } else {
            ((behind + WINDOW_DAYS as i64 - 1) / WINDOW_DAYS as i64) as usize
        }
    };

    let mut windows: Vec<Vec<Option<f64>>> = vec![Vec::new(); window_of(last) + 1];
    for (date, value) in points {
        windows[window_of(*date)].push(*value);
    }

    windows
        .iter()
        .enumerate()
        .map(|(i, values)| {
            let window_end = first_end
                .checked_add_days(Days::new(WINDOW_DAYS * i as u64))
                .ok_or_else(|| Error::Range(format!("window {i} after {first_end} overflows")))?;
            let positive = mean(values);
            Ok(IncidenceRecord {
                window_end,
                positive,
                incidence: positive.map(|m| round2(100_000.0 * m / population as f64)),
            })
        })
        .collect()
}

fn first_window_end(date: NaiveDate) -> Result<NaiveDate> {
    let anchor = WINDOW_ANCHOR.num_days_from_monday();
    let ahead = (anchor + 7 - date.weekday().num_days_from_monday()) % 7;
    date.checked_add_days(Days::new(ahead as u64))
        .ok_or_else(|| Error::Range(format!("no window end after {date}")))
}
