//! Candidate profile page → detail record.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{parse_name_and_age, salary_from};
use crate::candidate::CandidateDetail;
use crate::markup::{
    LOCALE_LETTERS, compile_static_regex, compile_static_selector, element_text, first_capture,
    first_text,
};

static NAME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("h1.section-title"));
static POSITION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("p.cv__user__position"));
static ADDRESS_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("div.cv__user__address"));
static HEADER_SELECTOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector(".cv__user"));
static HEADING_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("h2, h3, h4, h5, .cv__section__title"));
static LIST_ITEM_SELECTOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("li"));

static PARENTHESISED_AGE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"\((\d{1,3})\)"));
static BIRTH_DATE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r"Doğum tarixi:?\s*(\d{1,2}[./-]\d{1,2}[./-]\d{4}|\d{1,2}\s+\p{L}+\s+\d{4})",
    )
});
static LEADING_NON_LETTERS: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(&format!(r"^[^{LOCALE_LETTERS}]+")));

const EDUCATION_HEADINGS: [&str; 1] = ["Təhsil"];
const LANGUAGE_HEADINGS: [&str; 2] = ["Dil", "Dillər"];

/// Parses a candidate profile page. Never fails; absent fields stay empty.
#[must_use]
pub fn extract_detail(markup: &str) -> CandidateDetail {
    let document = Html::parse_document(markup);
    let root = document.root_element();
    let header = document.select(&HEADER_SELECTOR).next().unwrap_or(root);
    let header_text = element_text(header);
    let mut detail = CandidateDetail::default();

    if let Some(heading) = first_text(root, &NAME_SELECTOR) {
        let (name, age) = parse_name_and_age(&heading);
        detail.name = name;
        detail.age = age;
    }
    if detail.age.is_none() {
        detail.age = first_capture(&header_text, &PARENTHESISED_AGE).and_then(|age| age.parse().ok());
    }
    if let Some(position) = first_text(root, &POSITION_SELECTOR) {
        detail.position = position;
    }
    if let Some(address) = first_text(root, &ADDRESS_SELECTOR) {
        detail.location = LEADING_NON_LETTERS.replace(&address, "").trim().to_string();
    }
    if let Some(salary) = salary_from(&header_text) {
        detail.salary = salary;
    }

    let page_text = element_text(root);
    if let Some(birth_date) = first_capture(&page_text, &BIRTH_DATE) {
        detail.birth_date = birth_date;
    }
    detail.education = section_entries(&document, &EDUCATION_HEADINGS);
    detail.languages = section_entries(&document, &LANGUAGE_HEADINGS);
    detail
}

/// Entries under the first heading whose text is one of `titles`.
///
/// Entries are the `li` texts of the blocks that follow the heading up to the
/// next heading; a block without list items counts as one entry.
fn section_entries(document: &Html, titles: &[&str]) -> Vec<String> {
    let Some(heading) = document.select(&HEADING_SELECTOR).find(|heading| {
        let text = element_text(*heading);
        let text = text.trim_end_matches(':');
        titles.iter().any(|title| text.eq_ignore_ascii_case(title))
    }) else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for sibling in heading.next_siblings().filter_map(ElementRef::wrap) {
        if HEADING_SELECTOR.matches(&sibling) {
            break;
        }
        let items: Vec<String> = sibling
            .select(&LIST_ITEM_SELECTOR)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect();
        if items.is_empty() {
            let text = element_text(sibling);
            if !text.is_empty() {
                entries.push(text);
            }
        } else {
            entries.extend(items);
        }
    }
    entries
}
