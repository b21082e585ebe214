use std::collections::HashMap;

use chrono::NaiveDate;
use scraper::{ElementRef, Html};
use tracing::debug;

use super::element_text;
use super::locate::TableFragment;
use crate::error::{Error, Result};
use crate::frame::{DatedTable, RawTable};

/// Upper bound for `colspan` / `rowspan` values.
const MAX_SPAN: usize = 1000;

/// Parses the fragment and stamps every row with `date`.
pub fn extract_table(fragment: &TableFragment, date: NaiveDate) -> Result<DatedTable> {
    let table = parse_table(fragment.html())?;
    debug!(%date, rows = table.len(), columns = table.columns().len(), "Table extracted");
    Ok(DatedTable::new(date, &table))
}

struct Cell {
    text: Option<String>,
    header: bool,
    colspan: usize,
    rowspan: usize,
}

struct HtmlRow {
    cells: Vec<Cell>,
    in_thead: bool,
}

/// Converts the first `<table>` in `html` into a [`RawTable`].
///
/// Spanning cells are repeated over every grid position they cover. Header
/// rows are the `<thead>` rows or, without one, the leading rows made only
/// of `<th>` cells.
pub fn parse_table(html: &str) -> Result<RawTable> {
    let doc = Html::parse_fragment(html);
    let table = doc
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
        .ok_or_else(|| Error::Parse("fragment contains no <table>".into()))?;

    let rows = table_rows(table);
    if rows.is_empty() {
        return Err(Error::Parse("table has no rows".into()));
    }

    let header_count = if rows.iter().any(|r| r.in_thead) {
        rows.iter().take_while(|r| r.in_thead).count()
    } else {
        rows.iter()
            .take_while(|r| !r.cells.is_empty() && r.cells.iter().all(|c| c.header))
            .count()
    };

    let grid = expand_spans(&rows);
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    let columns = column_names(&grid[..header_count], width);
    let body = grid[header_count..].to_vec();

    Ok(RawTable::new(columns, body))
}

/// Rows in document order, skipping rows of nested tables.
fn table_rows(table: ElementRef<'_>) -> Vec<HtmlRow> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(read_row(child, false)),
            section @ ("thead" | "tbody" | "tfoot") => {
                for tr in child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|el| el.value().name() == "tr")
                {
                    rows.push(read_row(tr, section == "thead"));
                }
            }
            _ => {}
        }
    }
    rows
}

fn read_row(tr: ElementRef<'_>, in_thead: bool) -> HtmlRow {
    let cells = tr
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "td" | "th"))
        .map(|el| {
            let text = element_text(&el);
            Cell {
                text: (!text.is_empty()).then_some(text),
                header: el.value().name() == "th",
                colspan: span(&el, "colspan"),
                rowspan: span(&el, "rowspan"),
            }
        })
        .collect();
    HtmlRow { cells, in_thead }
}

fn span(el: &ElementRef<'_>, attr: &str) -> usize {
    el.value()
        .attr(attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_SPAN)
}

/// Lays cells out on a grid, copying spanning cells into every slot they cover.
fn expand_spans(rows: &[HtmlRow]) -> Vec<Vec<Option<String>>> {
    let mut slots: HashMap<(usize, usize), Option<String>> = HashMap::new();
    let mut widths = vec![0usize; rows.len()];

    for (r, row) in rows.iter().enumerate() {
        let mut col = 0;
        for cell in &row.cells {
            while slots.contains_key(&(r, col)) {
                col += 1;
            }
            for dr in 0..cell.rowspan.min(rows.len() - r) {
                for dc in 0..cell.colspan {
                    slots.insert((r + dr, col + dc), cell.text.clone());
                    widths[r + dr] = widths[r + dr].max(col + dc + 1);
                }
            }
            col += cell.colspan;
        }
    }

    widths
        .iter()
        .enumerate()
        .map(|(r, &w)| (0..w).map(|c| slots.get(&(r, c)).cloned().flatten()).collect())
        .collect()
}

/// One name per column from the stacked header rows.
///
/// Repeated texts down a column (from `rowspan`) are kept once; names that
/// still collide get `.1`, `.2`, ... suffixes.
fn column_names(header: &[Vec<Option<String>>], width: usize) -> Vec<String> {
    let mut names: Vec<String> = (0..width)
        .map(|c| {
            if header.is_empty() {
                return c.to_string();
            }
            let mut parts: Vec<&str> = Vec::new();
            for row in header {
                if let Some(Some(text)) = row.get(c) {
                    if parts.last() != Some(&text.as_str()) {
                        parts.push(text);
                    }
                }
            }
            if parts.is_empty() {
                format!("Unnamed: {c}")
            } else {
                parts.join(" ")
            }
        })
        .collect();

    let mut seen: HashMap<String, usize> = HashMap::new();
    for name in names.iter_mut() {
        let count = seen.entry(name.clone()).or_insert(0);
        if *count > 0 {
            *name = format!("{name}.{count}");
        }
        *count += 1;
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col_names(table: &RawTable) -> Vec<&str> {
        table.columns().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_simple_table_with_thead() {
        let table = parse_table(
            r#"<table>
                 <caption>Tests</caption>
                 <thead><tr><th>Country</th><th>Total tests</th><th>Positive tests</th></tr></thead>
                 <tbody>
                   <tr><td>Poland</td><td>1,204</td><td>12</td></tr>
                   <tr><td>Spain</td><td>830</td><td></td></tr>
                 </tbody>
               </table>"#,
        )
        .unwrap();

        assert_eq!(col_names(&table), vec!["Country", "Total tests", "Positive tests"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "Total tests"), Some("1,204"));
        assert_eq!(table.get(1, "Positive tests"), None);
    }

    #[test]
    fn test_header_row_of_th_without_thead() {
        let table = parse_table(
            "<table><tr><th>A</th><th>B</th></tr><tr><td>1</td><td>2</td></tr></table>",
        )
        .unwrap();

        assert_eq!(col_names(&table), vec!["A", "B"]);
        assert_eq!(table.get(0, "B"), Some("2"));
    }

    #[test]
    fn test_headerless_table_uses_positions() {
        let table = parse_table("<table><tr><td>x</td><td>y</td></tr></table>").unwrap();

        assert_eq!(col_names(&table), vec!["0", "1"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_merged_header_cells() {
        let table = parse_table(
            r#"<table>
                 <tr><th rowspan="2">Country</th><th colspan="2">Tests</th></tr>
                 <tr><th>Total</th><th>Positive</th></tr>
                 <tr><td>Iceland</td><td>100</td><td>4</td></tr>
               </table>"#,
        )
        .unwrap();

        assert_eq!(col_names(&table), vec!["Country", "Tests Total", "Tests Positive"]);
        assert_eq!(table.get(0, "Tests Positive"), Some("4"));
    }

    #[test]
    fn test_rowspan_in_body_repeats_value() {
        let table = parse_table(
            r#"<table>
                 <tr><th>Region</th><th>Lab</th></tr>
                 <tr><td rowspan="2">North</td><td>L1</td></tr>
                 <tr><td>L2</td></tr>
               </table>"#,
        )
        .unwrap();

        assert_eq!(table.get(1, "Region"), Some("North"));
        assert_eq!(table.get(1, "Lab"), Some("L2"));
    }

    #[test]
    fn test_duplicate_names_are_suffixed() {
        let table = parse_table(
            "<table><tr><th colspan=\"2\">Tests</th></tr><tr><td>1</td><td>2</td></tr></table>",
        )
        .unwrap();
        assert_eq!(col_names(&table), vec!["Tests", "Tests.1"]);
    }

    #[test]
    fn test_nested_table_rows_are_ignored() {
        let table = parse_table(
            r#"<table>
                 <tr><th>A</th></tr>
                 <tr><td>outer<table><tr><td>inner</td></tr></table></td></tr>
               </table>"#,
        )
        .unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_no_table_is_parse_error() {
        assert!(matches!(parse_table("<div>not a table</div>"), Err(Error::Parse(_))));
        assert!(matches!(parse_table("<table></table>"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_extract_stamps_date() {
        let fragment = TableFragment::new("<table><tr><th>A</th></tr><tr><td>1</td></tr></table>");
        let date = NaiveDate::from_ymd_opt(2020, 6, 15).unwrap();
        let dated = extract_table(&fragment, date).unwrap();

        assert_eq!(dated.date(), date);
        assert_eq!(dated.table().get(0, "date"), Some("2020-06-15"));
        assert_eq!(dated.table().get(0, "A"), Some("1"));
    }
}
