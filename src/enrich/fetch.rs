//! Phone-reveal and profile requests for one candidate.

use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue, REFERER};
use serde_json::Value;
use tracing::{debug, instrument};

use super::error::EnrichError;
use crate::auth::AuthenticatedSession;
use crate::candidate::CandidateDetail;
use crate::extract::extract_detail;
use crate::site::{candidate_path, phone_path};

/// Reads the phone number out of a reveal-endpoint body.
///
/// The body must be a JSON object whose `error` flag is present and false;
/// `phone` may be a string or a number.
///
/// # Errors
///
/// Returns [`EnrichError::Malformed`] for non-JSON or empty values and
/// [`EnrichError::PhoneWithheld`] when the error flag is set or missing.
pub fn parse_phone_payload(candidate_id: &str, body: &str) -> Result<String, EnrichError> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|e| EnrichError::malformed(candidate_id, format!("invalid JSON: {e}")))?;
    let Value::Object(payload) = payload else {
        return Err(EnrichError::malformed(candidate_id, "expected a JSON object"));
    };

    if payload.get("error").and_then(Value::as_bool) != Some(false) {
        return Err(EnrichError::PhoneWithheld {
            candidate_id: candidate_id.to_string(),
        });
    }

    let phone = match payload.get("phone") {
        Some(Value::String(phone)) => phone.trim().to_string(),
        Some(Value::Number(phone)) => phone.to_string(),
        _ => String::new(),
    };
    if phone.is_empty() {
        return Err(EnrichError::malformed(candidate_id, "no phone value"));
    }
    Ok(phone)
}

/// Fetches a candidate's phone number from the reveal endpoint.
///
/// # Errors
///
/// Returns [`EnrichError`] on transport failure, non-2xx status, or an
/// unusable payload.
#[instrument(level = "debug", skip(session))]
pub async fn fetch_phone(session: &AuthenticatedSession, candidate_id: &str) -> Result<String, EnrichError> {
    let client = session.client();
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Ok(profile) = client.url_for(&candidate_path(candidate_id))
        && let Ok(referer) = HeaderValue::from_str(profile.as_str())
    {
        headers.insert(REFERER, referer);
    }

    let response = client
        .get_with_headers(&phone_path(candidate_id), headers)
        .await
        .map_err(|e| EnrichError::request(candidate_id, e))?;
    if !response.is_success() {
        return Err(EnrichError::HttpStatus {
            candidate_id: candidate_id.to_string(),
            status: response.status,
        });
    }
    let phone = parse_phone_payload(candidate_id, &response.body)?;
    debug!(candidate_id, "phone revealed");
    Ok(phone)
}

/// Fetches and parses a candidate's profile page.
///
/// # Errors
///
/// Returns [`EnrichError`] on transport failure or non-2xx status. Parsing
/// itself never fails.
#[instrument(level = "debug", skip(session))]
pub async fn fetch_detail(
    session: &AuthenticatedSession,
    candidate_id: &str,
) -> Result<CandidateDetail, EnrichError> {
    let response = session
        .client()
        .get(&candidate_path(candidate_id))
        .await
        .map_err(|e| EnrichError::request(candidate_id, e))?;
    if !response.is_success() {
        return Err(EnrichError::HttpStatus {
            candidate_id: candidate_id.to_string(),
            status: response.status,
        });
    }
    Ok(extract_detail(&response.body))
}
