//! HTML table location and extraction for archived pages.

mod extract;
mod locate;

pub use extract::{extract_table, parse_table};
pub use locate::{TableFragment, locate_table, parse_page};

use scraper::ElementRef;

/// Text content of an element with runs of whitespace collapsed to one space.
pub(crate) fn element_text(el: &ElementRef<'_>) -> String {
    let raw: String = el.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
