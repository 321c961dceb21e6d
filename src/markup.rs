//! Shared helpers for markup extraction: static regex/selector compilation and text cleanup.

use regex::Regex;
use scraper::{ElementRef, Selector};

/// Azerbaijani Latin letters accepted in free-text location fields.
pub const LOCALE_LETTERS: &str = "A-Za-zƏəÜüÖöĞğIıİiŞşÇç";

/// Compiles a regex at static init; panics on invalid pattern.
pub fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Compiles a CSS selector at static init; panics on invalid selector.
pub fn compile_static_selector(selector: &str) -> Selector {
    Selector::parse(selector).unwrap_or_else(|e| panic!("invalid static selector '{selector}': {e:?}"))
}

/// Collapses every whitespace run to a single space and trims the ends.
#[must_use]
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the element's text content with whitespace collapsed.
#[must_use]
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Returns the collapsed text of the first descendant matching `selector`, if any.
#[must_use]
pub fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

/// Returns the first capture of `regex` in `haystack`, trimmed.
#[must_use]
pub fn first_capture(haystack: &str, regex: &Regex) -> Option<String> {
    regex
        .captures(haystack)
        .and_then(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
        .filter(|value| !value.is_empty())
}
