//! Loading local tabular records.

use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use tracing::debug;

use crate::frame::{Frame, FrameSpec, RawTable};

/// Reads a headed CSV file into a [`RawTable`]. Empty fields become missing cells.
pub fn read_table(path: impl AsRef<Path>) -> Result<RawTable> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV '{}'", path.display()))?;

    let columns: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read header of '{}'", path.display()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("Bad record {} in '{}'", line + 1, path.display()))?;
        rows.push(
            record
                .iter()
                .map(|cell| {
                    let cell = cell.trim();
                    (!cell.is_empty()).then(|| cell.to_string())
                })
                .collect(),
        );
    }

    debug!(path = %path.display(), rows = rows.len(), columns = columns.len(), "CSV loaded");
    Ok(RawTable::new(columns, rows))
}

/// Reads a CSV file and converts it with `spec`.
pub fn read_frame(path: impl AsRef<Path>, spec: &FrameSpec) -> Result<Frame> {
    let path = path.as_ref();
    let table = read_table(path)?;
    table
        .to_frame(spec)
        .with_context(|| format!("Failed to convert '{}'", path.display()))
}
