//! Fixed URL layout of the target cv-pool deployment.

/// Production deployment root.
pub const DEFAULT_BASE_URL: &str = "https://www.hellojob.az";

/// Home page, requested once to seed session cookies.
pub const HOME_PATH: &str = "/";

/// Login page (GET) and login submit (POST).
pub const LOGIN_PATH: &str = "/account/login";

/// Candidate listing index. Page 1 carries no query parameter.
pub const LISTING_PATH: &str = "/hr/cv-pool";

/// Cookie carrying the double-submit anti-forgery token.
pub const XSRF_COOKIE: &str = "XSRF-TOKEN";

/// Path of one listing page.
#[must_use]
pub fn listing_path(page: u32) -> String {
    if page <= 1 {
        LISTING_PATH.to_string()
    } else {
        format!("{LISTING_PATH}?page={page}")
    }
}

/// Path of a candidate's profile page.
#[must_use]
pub fn candidate_path(candidate_id: &str) -> String {
    format!("{LISTING_PATH}/cv/{candidate_id}")
}

/// Path of a candidate's phone-reveal endpoint.
#[must_use]
pub fn phone_path(candidate_id: &str) -> String {
    format!("{LISTING_PATH}/cv/{candidate_id}/show-phone")
}
