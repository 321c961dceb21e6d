//! Best-effort field extraction from listing and profile markup.
//!
//! Extraction never fails. A field that does not match stays empty and has no
//! effect on its siblings.

mod detail;
mod listing;

use std::sync::LazyLock;

use regex::Regex;

use crate::markup::{collapse_whitespace, compile_static_regex};

pub use detail::extract_detail;
pub use listing::extract_candidates;

static NAME_WITH_AGE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"^(.*?)\s*\((\d{1,3})\)\s*$"));
static SALARY: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"(\d+)\s*AZN"));

/// Splits "Name Surname (NN)" into name and age.
///
/// Without a trailing parenthesised integer the whole span is the name.
#[must_use]
pub fn parse_name_and_age(span: &str) -> (String, Option<u8>) {
    let span = collapse_whitespace(span);
    if let Some(caps) = NAME_WITH_AGE.captures(&span)
        && let (Some(name), Some(age)) = (caps.get(1), caps.get(2))
        && let Ok(age) = age.as_str().parse::<u8>()
    {
        return (name.as_str().trim().to_string(), Some(age));
    }
    (span, None)
}

/// First "NNNN AZN" amount in the text, normalised to a single space.
pub(crate) fn salary_from(text: &str) -> Option<String> {
    SALARY
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|amount| format!("{} AZN", amount.as_str()))
}
