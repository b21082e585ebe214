use scraper::{ElementRef, Html};

use super::element_text;

/// Outer HTML of one `<table>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFragment {
    html: String,
}

impl TableFragment {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

/// Parses page content into a DOM.
pub fn parse_page(content: &str) -> Html {
    Html::parse_document(content)
}

/// Returns the table of the first `<caption>`, in document order, whose text
/// contains `caption`. Matching is case-sensitive. `None` means the page does
/// not carry the table.
pub fn locate_table(page: &Html, caption: &str) -> Option<TableFragment> {
    page.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "caption")
        .filter(|el| element_text(el).contains(caption))
        .find_map(|el| {
            el.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|a| a.value().name() == "table")
        })
        .map(|table| TableFragment::new(table.html()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <table><caption>Summary</caption><tr><th>A</th></tr><tr><td>1</td></tr></table>
          <p>Some text</p>
          <table><caption>Daily arrivals by country</caption><tr><th>B</th></tr><tr><td>2</td></tr></table>
        </body></html>"#;

    #[test]
    fn test_finds_second_table_by_substring() {
        let page = parse_page(PAGE);
        let table = locate_table(&page, "arrivals").unwrap();

        assert!(table.html().contains("Daily arrivals by country"));
        assert!(!table.html().contains("Summary"));
    }

    #[test]
    fn test_missing_caption_is_none() {
        let page = parse_page(PAGE);
        assert!(locate_table(&page, "missing").is_none());
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let page = parse_page(PAGE);
        assert!(locate_table(&page, "Arrivals").is_none());
        assert!(locate_table(&page, "Daily").is_some());
    }

    #[test]
    fn test_first_match_wins() {
        let page = parse_page(
            r#"<table id="one"><caption>Tests (week 1)</caption><tr><td>1</td></tr></table>
               <table id="two"><caption>Tests (week 2)</caption><tr><td>2</td></tr></table>"#,
        );
        let table = locate_table(&page, "Tests").unwrap();
        assert!(table.html().contains(r#"id="one""#));
    }

    #[test]
    fn test_caption_with_markup() {
        let page = parse_page(
            "<table><caption><b>Tests</b>\n   performed <sup>[1]</sup></caption><tr><td>1</td></tr></table>",
        );
        assert!(locate_table(&page, "Tests performed").is_some());
    }
}
