pub mod dialog;
pub mod rows;

use scraper::{ElementRef, Selector};

use crate::error::{Result, ScrapeError};

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::Script {
        reason: format!("invalid selector '{css}': {e}"),
    })
}

/// Trimmed text of the first match under `scope`, empty when absent.
pub(crate) fn first_text(scope: ElementRef<'_>, sel: &Selector) -> String {
    scope
        .select(sel)
        .next()
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
        .unwrap_or_default()
}

pub(crate) fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
