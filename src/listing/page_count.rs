//! Total page count discovery and crawl range selection.
//!
//! The pagination widget does not render the same way in every listing state,
//! so discovery falls through three tiers:
//!
//! 1. numeric entries in the pagination controls, or a "X–Y of T" phrase
//! 2. the largest `page=N` referenced anywhere in the markup
//! 3. a configured default

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::markup::{collapse_whitespace, compile_static_regex, compile_static_selector, element_text};

static PAGINATION_ENTRY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    compile_static_selector(".pagination a, .pagination span, .pagination li")
});
static SHOWING_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"(?i)(\d+)\s*[-–]\s*(\d+)\s*(?:of|/|из)\s*(\d+)")
});
static PAGE_PARAMETER: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"[?&;]page=(\d+)"));

/// Which discovery tier produced a page count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCountSource {
    /// Largest number rendered in the pagination controls.
    PaginationControls,
    /// Derived from a "X–Y of T" phrase.
    ShowingPhrase,
    /// Largest `page=N` query value in the markup.
    PageLinks,
    /// No signal found; the configured default was used.
    ConfiguredDefault,
}

impl PageCountSource {
    /// Returns true if the count was read from the markup.
    #[must_use]
    pub fn is_discovered(self) -> bool {
        self != Self::ConfiguredDefault
    }
}

/// Total number of listing pages and how it was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCount {
    /// Total pages (at least 1).
    pub total: u32,
    /// Discovery tier.
    pub source: PageCountSource,
}

/// How many pages to crawl from the start page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelection {
    /// Every page from the start page to the last discovered page.
    All,
    /// At most this many pages.
    Count(u32),
}

impl FromStr for PageSelection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        match trimmed.parse::<u32>() {
            Ok(0) => Err("page count must be at least 1".to_string()),
            Ok(count) => Ok(Self::Count(count)),
            Err(_) => Err(format!("expected a positive integer or \"all\", got \"{trimmed}\"")),
        }
    }
}

impl fmt::Display for PageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Count(count) => write!(f, "{count}"),
        }
    }
}

/// Discovers the total page count from the first listing page.
#[must_use]
pub fn discover_page_count(first_page_markup: &str, default_total: u32) -> PageCount {
    if let Some(total) = pagination_controls_max(first_page_markup) {
        return PageCount {
            total,
            source: PageCountSource::PaginationControls,
        };
    }
    if let Some(total) = showing_phrase_pages(first_page_markup) {
        return PageCount {
            total,
            source: PageCountSource::ShowingPhrase,
        };
    }
    if let Some(total) = max_page_parameter(first_page_markup) {
        return PageCount {
            total,
            source: PageCountSource::PageLinks,
        };
    }
    PageCount {
        total: default_total.max(1),
        source: PageCountSource::ConfiguredDefault,
    }
}

/// Pages to crawl, in ascending order.
///
/// A `Count` selection is clamped to the discovered total; a configured-default
/// total is only a placeholder and does not clamp an explicit count.
#[must_use]
pub fn page_range(start_page: u32, selection: PageSelection, count: PageCount) -> Vec<u32> {
    let start = start_page.max(1);
    let end = match selection {
        PageSelection::All => count.total,
        PageSelection::Count(pages) => {
            let requested = start.saturating_add(pages.max(1) - 1);
            if count.source.is_discovered() {
                requested.min(count.total)
            } else {
                requested
            }
        }
    };
    (start..=end).collect()
}

fn pagination_controls_max(markup: &str) -> Option<u32> {
    let document = Html::parse_document(markup);
    document
        .select(&PAGINATION_ENTRY_SELECTOR)
        .filter_map(|entry| element_text(entry).parse::<u32>().ok())
        .filter(|page| *page > 0)
        .max()
}

fn showing_phrase_pages(markup: &str) -> Option<u32> {
    let document = Html::parse_document(markup);
    let text = collapse_whitespace(&document.root_element().text().collect::<Vec<_>>().join(" "));
    let caps = SHOWING_PHRASE.captures(&text)?;
    let first: u32 = caps.get(1)?.as_str().parse().ok()?;
    let last: u32 = caps.get(2)?.as_str().parse().ok()?;
    let total: u32 = caps.get(3)?.as_str().parse().ok()?;
    if first == 0 || last < first || total == 0 {
        return None;
    }
    let per_page = last - first + 1;
    Some(total.div_ceil(per_page))
}

fn max_page_parameter(markup: &str) -> Option<u32> {
    PAGE_PARAMETER
        .captures_iter(markup)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .filter(|page| *page > 0)
        .max()
}
