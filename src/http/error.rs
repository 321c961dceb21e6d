//! Error types for the shared HTTP client context.

use thiserror::Error;

/// Errors raised while building the client or issuing a request through it.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured base URL cannot be parsed or joined.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The offending URL or path.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// reqwest refused the builder configuration.
    #[error("failed to build HTTP client: {source}")]
    Build {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// The builder panicked while loading system proxy settings, even with the fallback.
    #[error("HTTP client construction panicked while loading proxy settings")]
    BuildPanicked,

    /// Network-level error (DNS, connection refused, TLS, body read).
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The connect-phase or total-duration timeout expired.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },
}

impl ClientError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Maps a reqwest error to `Timeout` or `Network`, attaching the URL.
    pub fn from_request(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Returns true if the request ran out of time.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

// No `From<reqwest::Error>`: every request error needs the URL it was issued for,
// which the source error does not reliably carry.
