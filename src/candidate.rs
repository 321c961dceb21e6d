//! Candidate records produced by extraction and completed by enrichment.

use std::collections::HashSet;

/// Phone enrichment state of one candidate.
///
/// `NotFetched` (never attempted) is distinct from `Unavailable` (attempted, no number).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PhoneStatus {
    /// Enrichment has not run for this candidate.
    #[default]
    NotFetched,
    /// The reveal endpoint returned a number.
    Found(String),
    /// The reveal endpoint was tried and yielded no number.
    Unavailable(String),
}

impl PhoneStatus {
    /// Returns the number, if one was found.
    #[must_use]
    pub fn number(&self) -> Option<&str> {
        match self {
            Self::Found(number) => Some(number),
            Self::NotFetched | Self::Unavailable(_) => None,
        }
    }
}

/// Profile-page enrichment state of one candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DetailStatus {
    /// Detail mode is off or enrichment has not run.
    #[default]
    NotRequested,
    /// The profile page was fetched and parsed.
    Fetched(CandidateDetail),
    /// The profile page could not be fetched.
    Unavailable(String),
}

impl DetailStatus {
    /// Returns the parsed detail, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&CandidateDetail> {
        match self {
            Self::Fetched(detail) => Some(detail),
            Self::NotRequested | Self::Unavailable(_) => None,
        }
    }
}

/// One listing entry. Every field except `id` is best-effort and may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSummary {
    /// Site-assigned numeric identifier, unique within a run.
    pub id: String,
    pub name: String,
    pub age: Option<u8>,
    pub position: String,
    /// Free-form, e.g. "1500 AZN".
    pub salary: String,
    pub location: String,
    /// e.g. "85%".
    pub completion_percentage: String,
    /// Free-form locale date, e.g. "12 Sentyabr 2025".
    pub posted_date: String,
    /// The listing shows a downloadable CV file.
    pub has_file: bool,
    pub phone: PhoneStatus,
}

impl CandidateSummary {
    /// Creates a summary with every optional field empty.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Fields parsed from a candidate's own profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateDetail {
    pub name: String,
    pub age: Option<u8>,
    pub position: String,
    pub location: String,
    pub salary: String,
    pub birth_date: String,
    /// Education entries in page order.
    pub education: Vec<String>,
    /// Language entries in page order.
    pub languages: Vec<String>,
}

/// A listing summary merged with its enrichment results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub summary: CandidateSummary,
    pub detail: DetailStatus,
}

impl Candidate {
    /// Wraps a summary that has not been enriched.
    #[must_use]
    pub fn from_summary(summary: CandidateSummary) -> Self {
        Self {
            summary,
            detail: DetailStatus::NotRequested,
        }
    }
}

/// Drops later occurrences of an already-seen `id`, keeping first-seen order.
#[must_use]
pub fn dedupe_by_id(candidates: Vec<CandidateSummary>) -> Vec<CandidateSummary> {
    let mut seen = HashSet::with_capacity(candidates.len());
    candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.id.clone()))
        .collect()
}
