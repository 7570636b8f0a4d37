//! Image source harvesting from rendered HTML.

use scraper::{Html, Selector};
use std::collections::HashSet;

/// Collect `src` attributes of the elements matching `selector`.
///
/// Sources are kept only when they start with one of `allowed_prefixes`.
/// Duplicates are removed and document order is preserved. An unparseable
/// selector yields nothing.
pub fn harvest_image_sources(html: &str, selector: &str, allowed_prefixes: &[&str]) -> Vec<String> {
    let selector = match Selector::parse(selector) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(selector, error = %e, "invalid image selector");
            return Vec::new();
        }
    };

    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut sources = Vec::new();

    for element in document.select(&selector) {
        let src = match element.value().attr("src") {
            Some(s) => s.trim(),
            None => continue,
        };

        if !allowed_prefixes.iter().any(|prefix| src.starts_with(prefix)) {
            continue;
        }

        if seen.insert(src.to_string()) {
            sources.push(src.to_string());
        }
    }

    sources
}
