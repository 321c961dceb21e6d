//! Error types for per-candidate enrichment.

use thiserror::Error;

use crate::http::ClientError;

/// Why one candidate's phone or profile could not be fetched.
///
/// Never fatal: the candidate is kept and the field is recorded as unavailable.
#[derive(Debug, Error)]
pub enum EnrichError {
    /// The request never produced a response.
    #[error("request for candidate {candidate_id} failed: {source}")]
    Request {
        /// Candidate identifier.
        candidate_id: String,
        /// The underlying client error.
        #[source]
        source: ClientError,
    },

    /// The server answered with a non-2xx status.
    #[error("candidate {candidate_id} returned HTTP {status}")]
    HttpStatus {
        /// Candidate identifier.
        candidate_id: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The phone endpoint reported an error or did not report success.
    #[error("phone withheld for candidate {candidate_id}")]
    PhoneWithheld {
        /// Candidate identifier.
        candidate_id: String,
    },

    /// The body could not be interpreted.
    #[error("malformed response for candidate {candidate_id}: {reason}")]
    Malformed {
        /// Candidate identifier.
        candidate_id: String,
        /// What was wrong with the body.
        reason: String,
    },
}

impl EnrichError {
    /// Creates a request error.
    pub fn request(candidate_id: impl Into<String>, source: ClientError) -> Self {
        Self::Request {
            candidate_id: candidate_id.into(),
            source,
        }
    }

    /// Creates a malformed-response error.
    pub fn malformed(candidate_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            candidate_id: candidate_id.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if the request ran out of time.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request { source, .. } if source.is_timeout())
    }
}
