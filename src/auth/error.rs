//! Error types for session establishment.

use thiserror::Error;

use crate::http::ClientError;

/// Errors that prevent a usable session from being established.
///
/// Every variant is fatal to a run: without a session no listing data is reachable.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A credential value was missing or blank.
    #[error("missing credential: {field} is empty")]
    MissingCredential {
        /// Which credential was missing.
        field: &'static str,
    },

    /// The login handshake could not reach the server.
    #[error("network error during login ({stage}): {source}")]
    Network {
        /// Handshake step that failed (warm-up, login page, login submit, probe).
        stage: &'static str,
        /// The underlying client error.
        #[source]
        source: ClientError,
    },

    /// The server answered but no authenticated state was observed.
    #[error("login rejected via {transport} transport: {reason}")]
    Rejected {
        /// Transport encoding of the final attempt.
        transport: String,
        /// What the server showed instead of an authenticated page.
        reason: String,
    },
}

impl AuthError {
    /// Creates a network error for a handshake stage.
    pub fn network(stage: &'static str, source: ClientError) -> Self {
        Self::Network { stage, source }
    }

    /// Creates a rejection error.
    pub fn rejected(transport: impl ToString, reason: impl Into<String>) -> Self {
        Self::Rejected {
            transport: transport.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns true if the server explicitly refused the credentials.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}
