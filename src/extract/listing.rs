//! Listing page → candidate summaries.
//!
//! Item boundaries come from the HTML parser; field patterns run only inside one
//! item's element so text from a neighbouring item can never leak into a field.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

use super::{parse_name_and_age, salary_from};
use crate::candidate::CandidateSummary;
use crate::markup::{
    LOCALE_LETTERS, collapse_whitespace, compile_static_regex, compile_static_selector,
    element_text, first_capture, first_text,
};

static ITEM_SELECTOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("[data-id]"));
static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(".vacancies__title"));
static COMPANY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(".vacancies__company"));

static COMPLETION: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(\d+)\s*%\s*tamamlandı"));

static PIN_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(&format!(
        r"(?s)svg-pin[^>]*>.*?</svg>\s*([{LOCALE_LETTERS}\s]+)"
    ))
});

static LIST_ITEM_SELECTOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("li"));
static ICON_SELECTOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("svg"));
static SINGLE_WORD: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(&format!(r"^[{LOCALE_LETTERS}]+$")));

static DATE_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        compile_static_regex(r"Yerləşdirildi:\s*(\d{1,2}\s+\p{L}+\s+\d{4})"),
        compile_static_regex(r"\b(\d{1,2}\s+\p{L}+\s+\d{4})\b"),
    ]
});

/// Marker class of the downloadable-CV icon.
const FILE_MARKER: &str = "svg-download2";

/// Parses every candidate item on a listing page.
///
/// Never fails: items without a numeric identifier are skipped and each field
/// falls back to empty independently.
#[must_use]
pub fn extract_candidates(markup: &str) -> Vec<CandidateSummary> {
    let document = Html::parse_document(markup);
    let candidates: Vec<CandidateSummary> = document
        .select(&ITEM_SELECTOR)
        .filter(|item| numeric_id(*item).is_some() && !nested_in_item(*item))
        .filter_map(extract_item)
        .collect();
    debug!(count = candidates.len(), "extracted listing items");
    candidates
}

fn extract_item(item: ElementRef<'_>) -> Option<CandidateSummary> {
    let mut candidate = CandidateSummary::new(numeric_id(item)?);
    let text = element_text(item);
    let outer = item.html();

    if let Some(position) = first_text(item, &TITLE_SELECTOR) {
        candidate.position = position;
    }
    if let Some(company) = first_text(item, &COMPANY_SELECTOR) {
        let (name, age) = parse_name_and_age(&company);
        candidate.name = name;
        candidate.age = age;
    }
    if let Some(percent) = first_capture(&text, &COMPLETION) {
        candidate.completion_percentage = format!("{percent}%");
    }
    if let Some(salary) = salary_from(&text) {
        candidate.salary = salary;
    }
    if let Some(location) = location_from(item, &outer) {
        candidate.location = location;
    }
    if let Some(date) = first_match(&text, DATE_PATTERNS.iter()) {
        candidate.posted_date = date;
    }
    candidate.has_file = outer.contains(FILE_MARKER);

    trace!(id = %candidate.id, name = %candidate.name, "extracted item");
    Some(candidate)
}

fn numeric_id(element: ElementRef<'_>) -> Option<&str> {
    element
        .value()
        .attr("data-id")
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
}

fn nested_in_item(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| numeric_id(ancestor).is_some())
}

/// The pinned location, else a one-word list entry led by an icon other than
/// the download marker.
fn location_from(item: ElementRef<'_>, outer: &str) -> Option<String> {
    first_match(outer, std::iter::once(&*PIN_LOCATION)).or_else(|| {
        item.select(&LIST_ITEM_SELECTOR)
            .filter(|entry| {
                entry.select(&ICON_SELECTOR).next().is_some_and(|icon| {
                    !icon
                        .value()
                        .attr("class")
                        .is_some_and(|class| class.contains(FILE_MARKER))
                })
            })
            .map(element_text)
            .find(|text| SINGLE_WORD.is_match(text))
    })
}

fn first_match<'a>(haystack: &str, patterns: impl Iterator<Item = &'a Regex>) -> Option<String> {
    patterns
        .filter_map(|pattern| first_capture(haystack, pattern))
        .map(|value| collapse_whitespace(&value))
        .find(|value| !value.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const FULL_ITEM: &str = r##"
        <div class="vacancies__item" data-id="123">
          <a class="vacancies__title" href="/hr/cv-pool/cv/123">Backend Developer</a>
          <div class="vacancies__company">Ali Valiyev (29)</div>
          <ul class="vacancies__info">
            <li><svg class="svg-pin"><use href="#pin"></use></svg> Bakı </li>
            <li>1500 AZN</li>
            <li>85% tamamlandı</li>
            <li>Yerləşdirildi: 12 Sentyabr 2025</li>
          </ul>
          <svg class="svg-download2"></svg>
        </div>"##;

    #[test]
    fn test_extract_full_item() {
        let candidates = extract_candidates(FULL_ITEM);
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.id, "123");
        assert_eq!(c.name, "Ali Valiyev");
        assert_eq!(c.age, Some(29));
        assert_eq!(c.position, "Backend Developer");
        assert_eq!(c.completion_percentage, "85%");
        assert_eq!(c.salary, "1500 AZN");
        assert_eq!(c.location, "Bakı");
        assert_eq!(c.posted_date, "12 Sentyabr 2025");
        assert!(c.has_file);
    }

    #[test]
    fn test_missing_fields_default_independently() {
        let markup = r#"
            <div data-id="1"><div class="vacancies__company">Leyla Məmmədova</div></div>
            <div data-id="2"><a class="vacancies__title">Mühasib</a><span>700 AZN</span></div>
            <div data-id="3"></div>"#;
        let candidates = extract_candidates(markup);
        assert_eq!(candidates.len(), 3);

        assert_eq!(candidates[0].name, "Leyla Məmmədova");
        assert_eq!(candidates[0].age, None);
        assert!(candidates[0].salary.is_empty());

        assert_eq!(candidates[1].position, "Mühasib");
        assert_eq!(candidates[1].salary, "700 AZN");
        assert!(candidates[1].name.is_empty());
        assert!(!candidates[1].has_file);

        assert_eq!(candidates[2].id, "3");
        assert!(candidates[2].position.is_empty());
        assert!(candidates[2].posted_date.is_empty());
    }

    #[test]
    fn test_count_matches_numeric_id_fragments() {
        let markup = r#"
            <div data-id="10"><span data-id="99">inner</span></div>
            <div data-id="11"></div>
            <div data-id="x12"></div>
            <div data-id=""></div>
            <div class="vacancies__item">no id</div>"#;
        let candidates = extract_candidates(markup);
        let ids: Vec<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["10", "11"]);
    }

    #[test]
    fn test_fields_do_not_bleed_between_items() {
        let markup = r#"
            <div data-id="1"><a class="vacancies__title">A</a></div>
            <div data-id="2"><span>900 AZN</span><span>40% tamamlandı</span></div>"#;
        let candidates = extract_candidates(markup);
        assert!(candidates[0].salary.is_empty());
        assert!(candidates[0].completion_percentage.is_empty());
        assert_eq!(candidates[1].salary, "900 AZN");
    }

    #[test]
    fn test_location_second_anchor_and_unlabelled_date() {
        let markup = r#"<div data-id="5">
            <ul><li><svg class="icon"></svg>Gəncə</li></ul>
            <p>3 Oktyabr 2025</p></div>"#;
        let c = &extract_candidates(markup)[0];
        assert_eq!(c.location, "Gəncə");
        assert_eq!(c.posted_date, "3 Oktyabr 2025");
    }

    #[test]
    fn test_download_icon_label_is_not_a_location() {
        let markup = r#"<div data-id="6">
            <ul><li><svg class="svg-download2"></svg>CV</li></ul></div>"#;
        let c = &extract_candidates(markup)[0];
        assert!(c.location.is_empty(), "got {:?}", c.location);
        assert!(c.has_file);

        let markup = r#"<div data-id="8">
            <ul><li><svg class="svg-download2"></svg>CV</li>
            <li><svg class="icon"></svg>Sumqayıt</li></ul></div>"#;
        assert_eq!(extract_candidates(markup)[0].location, "Sumqayıt");

        let markup = r#"<div data-id="9">
            <ul><li><svg class="svg-download2"></svg><span>Yüklə</span> PDF</li>
            <li><svg class="icon"></svg>Gəncə</li></ul></div>"#;
        assert_eq!(extract_candidates(markup)[0].location, "Gəncə");
    }

    #[test]
    fn test_attribute_order_and_whitespace_tolerated() {
        let markup = "<div\n  class='vacancies__item'\n  data-id='77'  >\n<div   class='vacancies__company'>\n  Orxan   Əliyev\n (35)\n</div></div>";
        let c = &extract_candidates(markup)[0];
        assert_eq!(c.id, "77");
        assert_eq!(c.name, "Orxan Əliyev");
        assert_eq!(c.age, Some(35));
    }

    #[test]
    fn test_empty_markup_yields_nothing() {
        assert!(extract_candidates("").is_empty());
        assert!(extract_candidates("<html><body>Heç nə tapılmadı</body></html>").is_empty());
    }
}
