//! Helpers shared by the HTML and JSON backends

use crate::error::BackendError;
use scraper::{ElementRef, Selector};
use url::Url;

/// Compile a CSS selector, reporting failures as parse errors
pub fn selector(css: &'static str) -> Result<Selector, BackendError> {
    Selector::parse(css).map_err(|e| BackendError::Parse(format!("invalid selector {css}: {e:?}")))
}

/// Collapse runs of whitespace and trim
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Concatenated, normalized text of an element
pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_text(&element.text().collect::<String>())
}

/// Text of the first element matching `sel` below `element`
pub fn first_text(element: ElementRef<'_>, sel: &Selector) -> Option<String> {
    element
        .select(sel)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// Attribute of the first element matching `sel` below `element`
pub fn first_attr(element: ElementRef<'_>, sel: &Selector, attr: &str) -> Option<String> {
    element
        .select(sel)
        .next()
        .and_then(|e| e.value().attr(attr))
        .map(str::to_string)
        .filter(|v| !v.is_empty())
}

/// Value of a query parameter in an absolute or protocol-relative URL
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let absolute = if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.to_string()
    };
    Url::parse(&absolute)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// Whether a link points at an absolute http(s) resource
pub fn is_absolute_http(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Strip all markup from an HTML fragment
pub fn strip_html(fragment: &str) -> String {
    let doc = scraper::Html::parse_fragment(fragment);
    normalize_text(&doc.root_element().text().collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  hello \n\t world  "), "hello world");
    }

    #[test]
    fn test_query_param() {
        assert_eq!(
            query_param("//duckduckgo.com/l/?uddg=https%3A%2F%2Frust-lang.org%2F&rut=x", "uddg").as_deref(),
            Some("https://rust-lang.org/")
        );
        assert_eq!(query_param("https://a.com/?q=1", "z"), None);
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<b>Rust</b> is <i>fast</i>"), "Rust is fast");
    }
}
