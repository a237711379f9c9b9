//! Page title lookup through a full HTML5 parser.

use std::sync::LazyLock;

use scraper::{Html, Selector};

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));
static HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("valid selector"));

/// Human-readable page title: `<title>`, else the first `<h1>`.
pub fn page_title(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    [&*TITLE, &*HEADING].into_iter().find_map(|selector| {
        doc.select(selector)
            .next()
            .map(|el| el.text().collect::<Vec<_>>().join(" "))
            .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|text| !text.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_title_element() {
        let html = "<html><head><title>  My   Site &amp; Co </title></head><body><h1>Other</h1></body></html>";
        assert_eq!(page_title(html).as_deref(), Some("My Site & Co"));
    }

    #[test]
    fn falls_back_to_first_heading() {
        let html = "<body><h1>Welcome <em>home</em></h1><h1>Second</h1></body>";
        assert_eq!(page_title(html).as_deref(), Some("Welcome home"));
    }

    #[test]
    fn blank_title_falls_through() {
        let html = "<title>  </title><h1>Fallback</h1>";
        assert_eq!(page_title(html).as_deref(), Some("Fallback"));
    }

    #[test]
    fn none_without_title_or_heading() {
        assert_eq!(page_title("<p>nothing</p>"), None);
    }
}
