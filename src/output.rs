//! CSV and JSON persistence for extracted tables and normalized series.

use std::fs::{File, OpenOptions};
use std::path::Path;

use anyhow::{Context, Result};
use csv::{Writer, WriterBuilder};
use serde::Serialize;
use tracing::debug;

use crate::analyzers::types::SeriesTable;
use crate::backfill::BackfillResult;
use crate::frame::RawTable;

fn raw_records(table: &RawTable) -> impl Iterator<Item = Vec<&str>> {
    table
        .rows()
        .iter()
        .map(|row| row.iter().map(|c| c.as_deref().unwrap_or("")).collect())
}

fn create(path: &Path) -> Result<Writer<File>> {
    Writer::from_path(path).with_context(|| format!("Failed to create '{}'", path.display()))
}

/// Writes a raw table with its header, replacing any existing file.
pub fn write_table(path: impl AsRef<Path>, table: &RawTable) -> Result<()> {
    let mut writer = create(path.as_ref())?;
    writer.write_record(table.columns())?;
    for record in raw_records(table) {
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Appends a raw table's rows to a CSV file.
///
/// The header is written only when the file does not exist yet.
pub fn append_table(path: impl AsRef<Path>, table: &RawTable) -> Result<()> {
    let path = path.as_ref();
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, rows = table.len(), "Appending CSV rows");

    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

    if !file_exists {
        writer.write_record(table.columns())?;
    }
    for record in raw_records(table) {
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes a normalized series using its canonical headers.
pub fn write_series(path: impl AsRef<Path>, series: &SeriesTable) -> Result<()> {
    let mut writer = create(path.as_ref())?;
    writer.write_record(series.headers())?;
    for record in series.records() {
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Serializes any record type (incidence windows, country totals) with a header row.
pub fn write_records<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> Result<()> {
    let mut writer = create(path.as_ref())?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Pretty JSON of a backfill's per-date outcomes.
pub fn report_json(result: &BackfillResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::month::MonthBucket;
    use crate::analyzers::types::{IncidenceRecord, Percentage, Period, SeriesRow};
    use crate::backfill::{DateOutcome, DateReport};
    use chrono::NaiveDate;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn sample_table() -> RawTable {
        RawTable::new(
            vec!["Country".into(), "Tests".into(), "date".into()],
            vec![vec![Some("FR".into()), None, Some("2020-06-15".into())]],
        )
    }

    #[test]
    fn test_write_table_round_trip_header() {
        let path = temp_path("covid_series_test_write.csv");
        write_table(&path, &sample_table()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Country,Tests,date\nFR,,2020-06-15\n");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_table_writes_header_once() {
        let path = temp_path("covid_series_test_append.csv");
        let _ = fs::remove_file(&path);

        append_table(&path, &sample_table()).unwrap();
        append_table(&path, &sample_table()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.starts_with("Country")).count();
        assert_eq!(header_count, 1);
        assert_eq!(content.lines().count(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_series_marks_no_data() {
        let path = temp_path("covid_series_test_series.csv");
        let series = SeriesTable {
            levels: vec![],
            extra_columns: vec![],
            country: Some("Iceland".into()),
            monthly: true,
            rows: vec![SeriesRow {
                period: Period::Month(MonthBucket::new(2020, 6).unwrap()),
                dims: vec![],
                total_tests: Some(0.0),
                positive_tests: Some(0.0),
                extra: vec![],
                positive_percentage: Some(Percentage::NoData),
            }],
        };
        write_series(&path, &series).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Month,Total tests,Positive tests,positive percentage,Country\nJun-2020,0,0,no data,Iceland\n"
        );

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_incidence_records() {
        let path = temp_path("covid_series_test_incidence.csv");
        let records = vec![IncidenceRecord {
            window_end: NaiveDate::from_ymd_opt(2020, 6, 21).unwrap(),
            positive: None,
            incidence: None,
        }];
        write_records(&path, &records).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "window_end,positive,incidence\n2020-06-21,,\n");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_report_json_lists_every_date() {
        let date = |d| NaiveDate::from_ymd_opt(2020, 6, d).unwrap();
        let result = BackfillResult {
            tables: vec![],
            report: vec![
                DateReport {
                    date: date(15),
                    outcome: DateOutcome::Extracted { rows: 3 },
                },
                DateReport {
                    date: date(16),
                    outcome: DateOutcome::NotFound,
                },
                DateReport {
                    date: date(17),
                    outcome: DateOutcome::FetchFailed("status 404".into()),
                },
            ],
            cancelled: false,
        };

        let json = report_json(&result).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let statuses: Vec<&str> = parsed["report"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["status"].as_str().unwrap())
            .collect();

        assert_eq!(statuses, vec!["extracted", "not_found", "fetch_failed"]);
        assert_eq!(parsed["report"][0]["date"], "2020-06-15");
        assert_eq!(parsed["report"][2]["detail"], "status 404");
        assert_eq!(parsed["cancelled"], false);
    }
}
