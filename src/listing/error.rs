//! Error types for listing page fetches.

use thiserror::Error;

use crate::http::ClientError;

/// Per-page fetch failures. A failed page yields fewer candidates, never a failed run.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Page indices start at 1.
    #[error("invalid listing page index {page}")]
    InvalidPage {
        /// The rejected index.
        page: u32,
    },

    /// The request never produced a response.
    #[error("listing page {page} request failed: {source}")]
    Request {
        /// Listing page index.
        page: u32,
        /// The underlying client error.
        #[source]
        source: ClientError,
    },

    /// The server answered with a non-2xx status.
    #[error("listing page {page} returned HTTP {status}")]
    HttpStatus {
        /// Listing page index.
        page: u32,
        /// The HTTP status code.
        status: u16,
    },

    /// The server served a login prompt instead of the listing.
    #[error("listing page {page} redirected to login; session expired")]
    SessionExpired {
        /// Listing page index.
        page: u32,
    },
}

impl FetchError {
    /// Creates a request error for a page.
    pub fn request(page: u32, source: ClientError) -> Self {
        Self::Request { page, source }
    }

    /// Returns the page index the error belongs to.
    #[must_use]
    pub fn page(&self) -> u32 {
        match self {
            Self::InvalidPage { page }
            | Self::Request { page, .. }
            | Self::HttpStatus { page, .. }
            | Self::SessionExpired { page } => *page,
        }
    }
}
