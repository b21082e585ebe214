//! In-memory tables.
//!
//! [`RawTable`] holds text cells exactly as they were scraped or read from a
//! CSV file. [`Frame`] is the numeric, date-indexed form the analyzers work on.
//! [`RawTable::to_frame`] converts one into the other using an explicit
//! [`FrameSpec`] so no column is ever guessed.

use chrono::NaiveDate;

use crate::dates::parse_date;
use crate::error::{Error, Result};

/// Name of the column stamped onto every extracted table.
pub const DATE_COLUMN: &str = "date";

/// Row key: the date plus the values of any further index levels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexKey {
    pub date: NaiveDate,
    pub dims: Vec<String>,
}

impl IndexKey {
    pub fn daily(date: NaiveDate) -> Self {
        Self { date, dims: Vec::new() }
    }

    pub fn with_dims(date: NaiveDate, dims: &[&str]) -> Self {
        Self {
            date,
            dims: dims.iter().map(|d| d.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub key: IndexKey,
    pub values: Vec<Option<f64>>,
}

/// A date-indexed table of numeric columns.
///
/// `levels` names the non-date index levels; a plain daily series has none.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    levels: Vec<String>,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Frame {
    pub fn new(levels: Vec<String>, columns: Vec<String>) -> Self {
        Self {
            levels,
            columns,
            rows: Vec::new(),
        }
    }

    /// Convenience constructor for a frame indexed by date only.
    pub fn daily(columns: &[&str]) -> Self {
        Self::new(Vec::new(), columns.iter().map(|c| c.to_string()).collect())
    }

    pub fn push(&mut self, key: IndexKey, values: Vec<Option<f64>>) -> Result<()> {
        if key.dims.len() != self.levels.len() {
            return Err(Error::Config(format!(
                "row has {} index levels, frame has {}",
                key.dims.len(),
                self.levels.len()
            )));
        }
        if values.len() != self.columns.len() {
            return Err(Error::Config(format!(
                "row has {} values, frame has {} columns",
                values.len(),
                self.columns.len()
            )));
        }
        self.rows.push(Row { key, values });
        Ok(())
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn level_index(&self, name: &str) -> Option<usize> {
        self.levels.iter().position(|l| l == name)
    }

    /// Values of one column in row order.
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Returns a copy with the given columns renamed.
    ///
    /// Every source column must exist.
    pub fn rename_columns(&self, mapping: &[(&str, &str)]) -> Result<Frame> {
        let mut columns = self.columns.clone();
        // indices resolve against the original names so swapped mappings work
        let targets = mapping
            .iter()
            .map(|(from, to)| {
                self.column_index(from)
                    .map(|idx| (idx, *to))
                    .ok_or_else(|| Error::Config(format!("column '{from}' not found")))
            })
            .collect::<Result<Vec<_>>>()?;
        for (idx, to) in targets {
            columns[idx] = to.to_string();
        }
        Ok(Frame {
            levels: self.levels.clone(),
            columns,
            rows: self.rows.clone(),
        })
    }

    pub(crate) fn with_rows(&self, rows: Vec<Row>) -> Frame {
        Frame {
            levels: self.levels.clone(),
            columns: self.columns.clone(),
            rows,
        }
    }
}

/// Which raw columns become the date, the index levels and the measures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSpec {
    pub date_col: String,
    pub dims: Vec<String>,
    pub measures: Vec<String>,
}

impl FrameSpec {
    pub fn new(date_col: &str, measures: &[&str]) -> Self {
        Self {
            date_col: date_col.to_string(),
            dims: Vec::new(),
            measures: measures.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn with_dims(mut self, dims: &[&str]) -> Self {
        self.dims = dims.iter().map(|d| d.to_string()).collect();
        self
    }
}

/// A rectangular table of text cells; `None` is an empty cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Builds a table, padding short rows with empty cells and dropping
    /// cells beyond the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// Returns a copy where `name` holds `value` on every row. An existing
    /// column of that name is overwritten, otherwise one is appended.
    pub fn with_constant_column(&self, name: &str, value: &str) -> RawTable {
        let mut columns = self.columns.clone();
        let idx = match self.column_index(name) {
            Some(idx) => idx,
            None => {
                columns.push(name.to_string());
                columns.len() - 1
            }
        };
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                row.resize(columns.len(), None);
                row[idx] = Some(value.to_string());
                row
            })
            .collect();
        RawTable { columns, rows }
    }

    /// Stacks tables vertically. Columns are the union of all headers in
    /// first-appearance order; cells a table lacks are empty.
    pub fn concat<'a, I>(tables: I) -> RawTable
    where
        I: IntoIterator<Item = &'a RawTable>,
    {
        let tables: Vec<&RawTable> = tables.into_iter().collect();
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for col in &table.columns {
                if !columns.contains(col) {
                    columns.push(col.clone());
                }
            }
        }

        let mut rows = Vec::new();
        for table in &tables {
            let positions: Vec<usize> = table
                .columns
                .iter()
                .filter_map(|c| columns.iter().position(|u| u == c))
                .collect();
            for src in &table.rows {
                let mut row = vec![None; columns.len()];
                for (cell, &pos) in src.iter().zip(&positions) {
                    row[pos] = cell.clone();
                }
                rows.push(row);
            }
        }

        RawTable { columns, rows }
    }

    /// Converts text cells into a numeric [`Frame`].
    pub fn to_frame(&self, spec: &FrameSpec) -> Result<Frame> {
        let find = |name: &str| {
            self.column_index(name)
                .ok_or_else(|| Error::Config(format!("column '{name}' not found")))
        };
        let date_idx = find(spec.date_col.as_str())?;
        let dim_idx = spec
            .dims
            .iter()
            .map(|d| find(d.as_str()))
            .collect::<Result<Vec<_>>>()?;
        let measure_idx = spec
            .measures
            .iter()
            .map(|m| find(m.as_str()))
            .collect::<Result<Vec<_>>>()?;

        let mut frame = Frame::new(spec.dims.clone(), spec.measures.clone());
        for (line, row) in self.rows.iter().enumerate() {
            let raw_date = row[date_idx]
                .as_deref()
                .ok_or_else(|| Error::Parse(format!("row {line}: empty date cell")))?;
            let date = parse_date(raw_date).map_err(|e| Error::Parse(format!("row {line}: {e}")))?;
            let dims = dim_idx
                .iter()
                .map(|&i| row[i].clone().unwrap_or_default())
                .collect();
            let values = measure_idx
                .iter()
                .map(|&i| match row[i].as_deref() {
                    Some(cell) => parse_number(cell).map_err(|e| {
                        Error::Parse(format!("row {line}, column '{}': {e}", self.columns[i]))
                    }),
                    None => Ok(None),
                })
                .collect::<Result<Vec<_>>>()?;
            frame.push(IndexKey { date, dims }, values)?;
        }

        Ok(frame)
    }
}

/// A table extracted from one archived snapshot.
///
/// Every row carries a `date` cell equal to the capture date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedTable {
    date: NaiveDate,
    table: RawTable,
}

impl DatedTable {
    pub fn new(date: NaiveDate, table: &RawTable) -> Self {
        let stamp = date.format("%Y-%m-%d").to_string();
        Self {
            date,
            table: table.with_constant_column(DATE_COLUMN, &stamp),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn table(&self) -> &RawTable {
        &self.table
    }

    pub fn into_table(self) -> RawTable {
        self.table
    }
}

/// Parses a numeric cell as published on statistics pages.
///
/// Thousands separators, whitespace and footnote markers such as `[a]` are
/// ignored. Placeholders (`-`, `n/a`) are missing values.
pub fn parse_number(cell: &str) -> std::result::Result<Option<f64>, String> {
    let mut cleaned = String::with_capacity(cell.len());
    let mut in_note = false;
    for ch in cell.chars() {
        match ch {
            '[' => in_note = true,
            ']' => in_note = false,
            _ if in_note => {}
            ',' | '\u{a0}' | '\u{202f}' => {}
            c if c.is_whitespace() => {}
            c => cleaned.push(c),
        }
    }

    match cleaned.as_str() {
        "" | "-" | "\u{2013}" | "\u{2014}" => return Ok(None),
        s if s.eq_ignore_ascii_case("n/a") || s.eq_ignore_ascii_case("nan") => return Ok(None),
        _ => {}
    }

    cleaned
        .parse::<f64>()
        .map(Some)
        .map_err(|_| format!("not a number: '{}'", cell.trim()))
}
