//! Fetching one listing page through the authenticated session.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use super::error::FetchError;
use crate::auth::{AuthenticatedSession, looks_like_login_prompt};
use crate::markup::compile_static_regex;
use crate::site::{LOGIN_PATH, listing_path};

static ITEM_ID_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"data-id\s*=\s*["']?\d+"#));

/// Raw markup of one listing page.
#[derive(Debug, Clone)]
pub struct ListingPage {
    /// 1-based page index.
    pub page: u32,
    /// Response body.
    pub markup: String,
}

/// Returns true if the markup contains at least one numeric `data-id` item.
#[must_use]
pub fn looks_like_listing(markup: &str) -> bool {
    ITEM_ID_ATTRIBUTE.is_match(markup)
}

/// Fetches one listing page. Every call is a fresh request.
///
/// # Errors
///
/// Returns [`FetchError`] for index 0, transport failures, non-2xx statuses,
/// and responses that show the login prompt instead of the listing.
#[instrument(level = "debug", skip(session))]
pub async fn fetch_page(session: &AuthenticatedSession, page: u32) -> Result<ListingPage, FetchError> {
    if page == 0 {
        return Err(FetchError::InvalidPage { page });
    }

    let response = session
        .client()
        .get(&listing_path(page))
        .await
        .map_err(|e| FetchError::request(page, e))?;

    if !response.is_success() {
        return Err(FetchError::HttpStatus {
            page,
            status: response.status,
        });
    }
    if response.final_url.path() == LOGIN_PATH
        || (looks_like_login_prompt(&response.body) && !looks_like_listing(&response.body))
    {
        return Err(FetchError::SessionExpired { page });
    }

    debug!(page, bytes = response.body.len(), "listing page fetched");
    Ok(ListingPage {
        page,
        markup: response.body,
    })
}
