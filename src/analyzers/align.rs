//! Calendar alignment of sparse date-indexed frames.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::dates::{check_range, days};
use crate::error::{Error, Result};
use crate::frame::{Frame, IndexKey, Row};

/// Reindexes `frame` onto every day of `[start, end]`.
///
/// With extra index levels the new index is the product of the calendar and
/// each level's distinct values, in order of first appearance. Keys missing
/// from the input get all-missing rows; input rows outside the range are
/// dropped. The input frame is left untouched.
pub fn align(frame: &Frame, start: NaiveDate, end: NaiveDate) -> Result<Frame> {
    check_range(start, end)?;

    let mut lookup: HashMap<&IndexKey, &Row> = HashMap::with_capacity(frame.len());
    for row in frame.rows() {
        if lookup.insert(&row.key, row).is_some() {
            return Err(Error::DuplicateKey {
                date: row.key.date,
                dims: row.key.dims.clone(),
            });
        }
    }

    let combos = dimension_product(&level_values(frame));
    let width = frame.columns().len();

    let mut rows = Vec::new();
    for date in days(start, end) {
        for dims in &combos {
            let key = IndexKey {
                date,
                dims: dims.clone(),
            };
            let values = match lookup.get(&key) {
                Some(row) => row.values.clone(),
                None => vec![None; width],
            };
            rows.push(Row { key, values });
        }
    }

    debug!(
        input_rows = frame.len(),
        output_rows = rows.len(),
        combinations = combos.len(),
        "Aligned frame to calendar"
    );

    Ok(frame.with_rows(rows))
}

/// Keeps the rows dated within `[start, end]`, sorted by date. Gaps stay gaps.
pub fn restrict_to_range(frame: &Frame, start: NaiveDate, end: NaiveDate) -> Result<Frame> {
    check_range(start, end)?;
    let mut rows: Vec<Row> = frame
        .rows()
        .iter()
        .filter(|r| r.key.date >= start && r.key.date <= end)
        .cloned()
        .collect();
    rows.sort_by(|a, b| a.key.date.cmp(&b.key.date));
    Ok(frame.with_rows(rows))
}

/// Distinct values of each non-date level, in first-appearance order.
fn level_values(frame: &Frame) -> Vec<Vec<String>> {
    let mut levels: Vec<Vec<String>> = vec![Vec::new(); frame.levels().len()];
    for row in frame.rows() {
        for (seen, value) in levels.iter_mut().zip(&row.key.dims) {
            if !seen.contains(value) {
                seen.push(value.clone());
            }
        }
    }
    levels
}

/// Cartesian product of the level values, first level outermost.
fn dimension_product(levels: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut combos: Vec<Vec<String>> = vec![Vec::new()];
    for values in levels {
        combos = combos
            .iter()
            .flat_map(|prefix| {
                values.iter().map(move |v| {
                    let mut combo = prefix.clone();
                    combo.push(v.clone());
                    combo
                })
            })
            .collect();
    }
    combos
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sparse_daily() -> Frame {
        let mut frame = Frame::daily(&["tests", "positives"]);
        frame
            .push(IndexKey::daily(ymd(2020, 6, 17)), vec![Some(30.0), Some(3.0)])
            .unwrap();
        frame
            .push(IndexKey::daily(ymd(2020, 6, 15)), vec![Some(10.0), Some(1.0)])
            .unwrap();
        frame
            .push(IndexKey::daily(ymd(2020, 7, 1)), vec![Some(99.0), Some(9.0)])
            .unwrap();
        frame
    }

    #[test]
    fn test_fills_gaps_and_drops_out_of_range() {
        let frame = sparse_daily();
        let aligned = align(&frame, ymd(2020, 6, 14), ymd(2020, 6, 18)).unwrap();

        let dates: Vec<NaiveDate> = aligned.rows().iter().map(|r| r.key.date).collect();
        assert_eq!(
            dates,
            vec![
                ymd(2020, 6, 14),
                ymd(2020, 6, 15),
                ymd(2020, 6, 16),
                ymd(2020, 6, 17),
                ymd(2020, 6, 18)
            ]
        );
        assert_eq!(aligned.rows()[0].values, vec![None, None]);
        assert_eq!(aligned.rows()[1].values, vec![Some(10.0), Some(1.0)]);
        assert_eq!(aligned.rows()[3].values, vec![Some(30.0), Some(3.0)]);
        // the input still has its original three rows
        assert_eq!(frame.len(), 3);
    }

    #[test]
    fn test_multi_level_product() {
        let mut frame = Frame::new(vec!["Country".into()], vec!["tests".into()]);
        frame
            .push(IndexKey::with_dims(ymd(2020, 6, 15), &["SE"]), vec![Some(5.0)])
            .unwrap();
        frame
            .push(IndexKey::with_dims(ymd(2020, 6, 16), &["DK"]), vec![Some(7.0)])
            .unwrap();

        let aligned = align(&frame, ymd(2020, 6, 15), ymd(2020, 6, 17)).unwrap();

        assert_eq!(aligned.len(), 6);
        let keys: Vec<(NaiveDate, &str)> = aligned
            .rows()
            .iter()
            .map(|r| (r.key.date, r.key.dims[0].as_str()))
            .collect();
        assert_eq!(keys[0], (ymd(2020, 6, 15), "SE"));
        assert_eq!(keys[1], (ymd(2020, 6, 15), "DK"));
        assert_eq!(keys[5], (ymd(2020, 6, 17), "DK"));
        assert_eq!(aligned.rows()[3].values, vec![Some(7.0)]);
        assert_eq!(aligned.rows()[2].values, vec![None]);
    }

    #[test]
    fn test_every_combination_gets_every_day_once() {
        let mut frame = Frame::new(vec!["Country".into(), "Lab".into()], vec!["tests".into()]);
        frame
            .push(IndexKey::with_dims(ymd(2021, 1, 3), &["NO", "a"]), vec![Some(1.0)])
            .unwrap();
        frame
            .push(IndexKey::with_dims(ymd(2021, 1, 9), &["FI", "b"]), vec![Some(2.0)])
            .unwrap();

        let (start, end) = (ymd(2021, 1, 1), ymd(2021, 1, 10));
        let aligned = align(&frame, start, end).unwrap();

        // 2 countries x 2 labs x 10 days
        assert_eq!(aligned.len(), 40);
        let mut keys: Vec<&IndexKey> = aligned.rows().iter().map(|r| &r.key).collect();
        let sorted = {
            let mut k = keys.clone();
            k.sort_by_key(|k| k.date);
            k
        };
        assert_eq!(keys, sorted);
        keys.dedup();
        assert_eq!(keys.len(), 40);
    }

    #[test]
    fn test_already_complete_is_idempotent() {
        let mut frame = Frame::daily(&["tests"]);
        for (i, date) in days(ymd(2020, 6, 15), ymd(2020, 6, 20)).enumerate() {
            frame.push(IndexKey::daily(date), vec![Some(i as f64)]).unwrap();
        }

        let aligned = align(&frame, ymd(2020, 6, 15), ymd(2020, 6, 20)).unwrap();
        assert_eq!(aligned, frame);
    }

    #[test]
    fn test_inverted_range() {
        let frame = sparse_daily();
        assert!(matches!(
            align(&frame, ymd(2020, 6, 18), ymd(2020, 6, 14)),
            Err(Error::Range(_))
        ));
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let mut frame = Frame::daily(&["tests"]);
        frame.push(IndexKey::daily(ymd(2020, 6, 15)), vec![Some(1.0)]).unwrap();
        frame.push(IndexKey::daily(ymd(2020, 6, 15)), vec![Some(2.0)]).unwrap();

        assert!(matches!(
            align(&frame, ymd(2020, 6, 15), ymd(2020, 6, 16)),
            Err(Error::DuplicateKey { .. })
        ));
    }

    #[test]
    fn test_restrict_to_range_sorts_without_filling() {
        let frame = sparse_daily();
        let restricted = restrict_to_range(&frame, ymd(2020, 6, 1), ymd(2020, 6, 30)).unwrap();

        let dates: Vec<NaiveDate> = restricted.rows().iter().map(|r| r.key.date).collect();
        assert_eq!(dates, vec![ymd(2020, 6, 15), ymd(2020, 6, 17)]);
    }
}
