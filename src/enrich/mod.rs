//! Per-candidate enrichment: phone reveal and, optionally, the full profile.
//!
//! Enrichers never fail. Every outcome, including transport errors and
//! withheld numbers, is folded into an [`Enrichment`] so a missing phone is
//! always distinguishable from one that was never requested.
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::auth::AuthenticatedSession;
//! use harvester_core::enrich::{Enricher, PhoneEnricher};
//!
//! # async fn example(session: AuthenticatedSession) {
//! let enricher = PhoneEnricher::new(session);
//! let enrichment = enricher.enrich("123").await;
//! println!("phone: {:?}", enrichment.phone);
//! # }
//! ```

mod error;
mod fetch;

use async_trait::async_trait;
use tracing::debug;

use crate::auth::AuthenticatedSession;
use crate::candidate::{Candidate, CandidateSummary, DetailStatus, PhoneStatus};

pub use error::EnrichError;
pub use fetch::{fetch_detail, fetch_phone, parse_phone_payload};

/// Secondary data gathered for one candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub phone: PhoneStatus,
    pub detail: DetailStatus,
}

impl Enrichment {
    /// Enrichment for a candidate whose task did not complete.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            phone: PhoneStatus::Unavailable(reason.into()),
            detail: DetailStatus::NotRequested,
        }
    }

    /// Merges the enrichment into a summary. Consumes both, so it happens once.
    #[must_use]
    pub fn apply(self, mut summary: CandidateSummary) -> Candidate {
        summary.phone = self.phone;
        Candidate {
            summary,
            detail: self.detail,
        }
    }
}

/// Fetches secondary data for one candidate.
///
/// Uses `async_trait` so the pipeline can hold either variant as `Arc<dyn Enricher>`.
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Returns true if this enricher also fetches the profile page.
    fn includes_detail(&self) -> bool;

    /// Gathers secondary data for `candidate_id`; absorbs every error.
    async fn enrich(&self, candidate_id: &str) -> Enrichment;
}

/// Phone reveal only.
#[derive(Debug, Clone)]
pub struct PhoneEnricher {
    session: AuthenticatedSession,
}

impl PhoneEnricher {
    /// Creates a phone-only enricher over an authenticated session.
    #[must_use]
    pub fn new(session: AuthenticatedSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Enricher for PhoneEnricher {
    fn name(&self) -> &'static str {
        "phone"
    }

    fn includes_detail(&self) -> bool {
        false
    }

    async fn enrich(&self, candidate_id: &str) -> Enrichment {
        Enrichment {
            phone: phone_status(candidate_id, fetch_phone(&self.session, candidate_id).await),
            detail: DetailStatus::NotRequested,
        }
    }
}

/// Phone reveal plus profile page, fetched concurrently.
#[derive(Debug, Clone)]
pub struct DetailEnricher {
    session: AuthenticatedSession,
}

impl DetailEnricher {
    /// Creates a phone-and-profile enricher over an authenticated session.
    #[must_use]
    pub fn new(session: AuthenticatedSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Enricher for DetailEnricher {
    fn name(&self) -> &'static str {
        "detail"
    }

    fn includes_detail(&self) -> bool {
        true
    }

    async fn enrich(&self, candidate_id: &str) -> Enrichment {
        let (phone, detail) = tokio::join!(
            fetch_phone(&self.session, candidate_id),
            fetch_detail(&self.session, candidate_id)
        );
        let detail = match detail {
            Ok(detail) => DetailStatus::Fetched(detail),
            Err(error) => {
                debug!(candidate_id, error = %error, "profile unavailable");
                DetailStatus::Unavailable(error.to_string())
            }
        };
        Enrichment {
            phone: phone_status(candidate_id, phone),
            detail,
        }
    }
}

fn phone_status(candidate_id: &str, result: Result<String, EnrichError>) -> PhoneStatus {
    match result {
        Ok(phone) => PhoneStatus::Found(phone),
        Err(error) => {
            debug!(candidate_id, error = %error, "phone unavailable");
            PhoneStatus::Unavailable(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::CandidateDetail;

    #[test]
    fn test_apply_sets_phone_and_detail() {
        let enrichment = Enrichment {
            phone: PhoneStatus::Found("+994501234567".into()),
            detail: DetailStatus::Fetched(CandidateDetail {
                birth_date: "14.03.1996".into(),
                ..CandidateDetail::default()
            }),
        };
        let candidate = enrichment.apply(CandidateSummary::new("7"));
        assert_eq!(candidate.summary.id, "7");
        assert_eq!(candidate.summary.phone.number(), Some("+994501234567"));
        assert_eq!(candidate.detail.detail().map(|d| d.birth_date.as_str()), Some("14.03.1996"));
    }

    #[test]
    fn test_failed_enrichment_is_absent_not_unfetched() {
        let enrichment = Enrichment::failed("task panicked");
        assert_eq!(enrichment.phone, PhoneStatus::Unavailable("task panicked".into()));
        assert_eq!(Enrichment::default().phone, PhoneStatus::NotFetched);
    }

    #[test]
    fn test_phone_status_from_error() {
        let status = phone_status(
            "9",
            Err(EnrichError::PhoneWithheld {
                candidate_id: "9".into(),
            }),
        );
        assert!(matches!(status, PhoneStatus::Unavailable(reason) if reason.contains('9')));
    }
}
