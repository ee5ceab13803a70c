//! Candidate discovery from publisher landing pages.
//!
//! Some publishers list their monthly files on an index page with names that
//! no template predicts. Anchors whose target mentions the month in one of
//! its encodings become extra URL candidates.

use crate::error::CollectError;
use reqwest::Url;
use scraper::{Html, Selector};

fn html_selector(selector: &str) -> Result<Selector, CollectError> {
    Selector::parse(selector)
        .map_err(|e| CollectError::structure(format!("Failed to parse selector '{}': {}", selector, e)))
}

/// Collects absolute links from `html` whose href contains one of `needles`
/// (case-insensitive) and, when `suffixes` is not empty, ends with one of them.
pub fn discover_links(
    html: &str,
    page_url: &str,
    needles: &[String],
    suffixes: &[&str],
) -> Result<Vec<String>, CollectError> {
    let base = Url::parse(page_url)
        .map_err(|e| CollectError::structure(format!("invalid page URL '{}': {}", page_url, e)))?;
    let document = Html::parse_document(html);
    let selector = html_selector("a[href]")?;
    let needles: Vec<String> = needles.iter().map(|n| n.to_lowercase()).collect();

    let mut links = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let lower = href.trim().to_lowercase();
        let path = lower.split(['?', '#']).next().unwrap_or_default();

        if !needles.iter().any(|n| lower.contains(n.as_str())) {
            continue;
        }
        if !suffixes.is_empty() && !suffixes.iter().any(|s| path.ends_with(s)) {
            continue;
        }
        if let Ok(url) = base.join(href.trim()) {
            let url = url.to_string();
            if !links.contains(&url) {
                links.push(url);
            }
        }
    }
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::html::landing_page;

    #[test]
    fn test_discover_matching_links() {
        let html = landing_page(&[
            "/files/immat_2023_04.xlsx",
            "/files/Immat_2023_05_v2.XLSX",
            "https://cdn.example.org/immat_2023_05.pdf",
            "/files/immat_2023_05.xlsx?download=1",
        ]);

        let links = discover_links(
            &html,
            "https://example.org/donnees/immatriculations",
            &["2023_05".to_string()],
            &[".xlsx"],
        )
        .unwrap();

        assert_eq!(
            links,
            vec![
                "https://example.org/files/Immat_2023_05_v2.XLSX".to_string(),
                "https://example.org/files/immat_2023_05.xlsx?download=1".to_string(),
            ]
        );
    }

    #[test]
    fn test_no_matches() {
        let html = landing_page(&["/files/immat_2022_12.xlsx"]);
        let links =
            discover_links(&html, "https://example.org/", &["2023_05".to_string()], &[]).unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn test_invalid_page_url() {
        let result = discover_links("<html></html>", "not a url", &[], &[]);
        assert!(matches!(result, Err(CollectError::ParseStructure(_))));
    }
}
