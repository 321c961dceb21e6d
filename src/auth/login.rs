//! Login handshake: cookie seeding, token discovery, credential POST, verdict.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue, ORIGIN, REFERER};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use super::credentials::Credentials;
use super::error::AuthError;
use super::token::{AntiForgeryToken, TOKEN_FIELD, discover_token, hidden_login_fields};
use crate::http::{FetchedPage, HttpClient};
use crate::listing::looks_like_listing;
use crate::markup::compile_static_regex;
use crate::site::{HOME_PATH, LOGIN_PATH, XSRF_COOKIE, listing_path};

static PASSWORD_INPUT: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?i)<input[^>]+name\s*=\s*["']password["']"#));

/// Body encoding of the credential POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginTransport {
    /// `application/x-www-form-urlencoded`.
    Form,
    /// `application/json`.
    Json,
}

impl LoginTransport {
    /// The transport tried once after this one is rejected, if any.
    #[must_use]
    pub fn alternate(self) -> Option<Self> {
        match self {
            Self::Form => Some(Self::Json),
            Self::Json => None,
        }
    }
}

impl fmt::Display for LoginTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Form => write!(f, "form"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// What proved the session authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginEvidence {
    /// The POST was redirected away from the login page.
    Redirect {
        /// Path the redirect chain ended on.
        location: String,
    },
    /// The POST answered with a JSON success payload.
    JsonSuccess,
    /// The protected listing rendered candidate markup after the POST.
    ProtectedContent,
}

/// Classification of one login POST response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginVerdict {
    /// The response itself proves success.
    Success(LoginEvidence),
    /// The response shows the login was refused.
    Failure(String),
    /// Neither success nor failure is visible in the response.
    Inconclusive,
}

/// Handshake tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthOptions {
    /// GET `/` before the login page.
    pub warm_up: bool,
    /// Retry once with the JSON transport after a form rejection.
    pub json_fallback: bool,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            warm_up: true,
            json_fallback: true,
        }
    }
}

/// A client whose cookie jar holds an authenticated session.
///
/// Produced only by [`authenticate`]; clones of the inner client share the session.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    client: HttpClient,
    transport: LoginTransport,
    evidence: LoginEvidence,
}

impl AuthenticatedSession {
    /// Returns the authenticated client.
    #[must_use]
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Transport that succeeded.
    #[must_use]
    pub fn transport(&self) -> LoginTransport {
        self.transport
    }

    /// What proved the login.
    #[must_use]
    pub fn evidence(&self) -> &LoginEvidence {
        &self.evidence
    }
}

/// Returns true if the markup contains a password input (a login prompt).
#[must_use]
pub fn looks_like_login_prompt(markup: &str) -> bool {
    PASSWORD_INPUT.is_match(markup)
}

/// Classifies a login POST response without issuing further requests.
#[must_use]
pub fn classify_login_response(page: &FetchedPage) -> LoginVerdict {
    if page.was_redirected() && page.final_url.path() != LOGIN_PATH {
        return LoginVerdict::Success(LoginEvidence::Redirect {
            location: page.final_url.path().to_string(),
        });
    }

    let trimmed = page.body.trim_start();
    if (page.is_json() || trimmed.starts_with('{'))
        && let Ok(Value::Object(payload)) = serde_json::from_str::<Value>(trimmed)
    {
        return classify_json_payload(&payload, page.status);
    }

    if !page.is_success() {
        return LoginVerdict::Failure(format!("HTTP {}", page.status));
    }
    if looks_like_login_prompt(&page.body) {
        return LoginVerdict::Failure("login form re-rendered".to_string());
    }
    LoginVerdict::Inconclusive
}

fn classify_json_payload(payload: &Map<String, Value>, status: u16) -> LoginVerdict {
    let flagged_error = payload.get("error").and_then(Value::as_bool) == Some(true);
    let flagged_failure = payload.get("success").and_then(Value::as_bool) == Some(false);
    if flagged_error || flagged_failure || payload.contains_key("errors") {
        let message = payload
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("JSON error payload");
        return LoginVerdict::Failure(message.to_string());
    }
    if (200..300).contains(&status) {
        LoginVerdict::Success(LoginEvidence::JsonSuccess)
    } else {
        LoginVerdict::Failure(format!("HTTP {status}"))
    }
}

/// Performs the login handshake and returns the authenticated session.
///
/// Tries the form transport first and, when `options.json_fallback` is set, the
/// JSON transport once after a rejection. Network errors are never retried.
///
/// # Errors
///
/// Returns [`AuthError::Network`] if a handshake request fails and
/// [`AuthError::Rejected`] if no authenticated state is observed.
#[instrument(skip(client, credentials, options), fields(email = %credentials.email()))]
pub async fn authenticate(
    client: HttpClient,
    credentials: &Credentials,
    options: AuthOptions,
) -> Result<AuthenticatedSession, AuthError> {
    if options.warm_up
        && let Err(error) = client.get(HOME_PATH).await
    {
        warn!(error = %error, "warm-up request failed; continuing to login page");
    }

    let login_page = client
        .get(LOGIN_PATH)
        .await
        .map_err(|e| AuthError::network("login page", e))?;
    let hidden = hidden_login_fields(&login_page.body);
    let mut transport = LoginTransport::Form;

    loop {
        // Read per attempt: the server may rotate the cookie token on a rejected POST.
        let token = discover_token(
            client.cookie_value(XSRF_COOKIE).as_deref(),
            &login_page.body,
        );
        if token.is_none() {
            warn!("no anti-forgery token found; submitting login without one");
        }
        debug!(
            %transport,
            token_source = ?token.as_ref().map(AntiForgeryToken::source),
            hidden_fields = hidden.len(),
            "submitting login"
        );

        match submit_login(&client, credentials, token.as_ref(), &hidden, transport).await {
            Ok(evidence) => {
                info!(%transport, evidence = ?evidence, "authenticated");
                return Ok(AuthenticatedSession {
                    client,
                    transport,
                    evidence,
                });
            }
            Err(error) if error.is_rejected() && options.json_fallback => {
                let Some(next) = transport.alternate() else {
                    return Err(error);
                };
                warn!(error = %error, next = %next, "login rejected; retrying with alternate transport");
                transport = next;
            }
            Err(error) => return Err(error),
        }
    }
}

async fn submit_login(
    client: &HttpClient,
    credentials: &Credentials,
    token: Option<&AntiForgeryToken>,
    hidden: &[(String, String)],
    transport: LoginTransport,
) -> Result<LoginEvidence, AuthError> {
    let headers = login_headers(client, token, transport);
    let fields = login_fields(credentials, token, hidden);

    let response = match transport {
        LoginTransport::Form => client.post_form(LOGIN_PATH, &fields, headers).await,
        LoginTransport::Json => {
            let body: Map<String, Value> = fields
                .into_iter()
                .map(|(name, value)| (name, Value::String(value)))
                .collect();
            client
                .post_json(LOGIN_PATH, &Value::Object(body), headers)
                .await
        }
    }
    .map_err(|e| AuthError::network("login submit", e))?;

    let reason = match classify_login_response(&response) {
        LoginVerdict::Success(evidence) => return Ok(evidence),
        LoginVerdict::Failure(reason) => reason,
        LoginVerdict::Inconclusive => "no redirect or success payload".to_string(),
    };
    debug!(%transport, reason = %reason, "login response not conclusive; probing listing");

    if probe_protected_content(client).await? {
        Ok(LoginEvidence::ProtectedContent)
    } else {
        Err(AuthError::rejected(transport, reason))
    }
}

async fn probe_protected_content(client: &HttpClient) -> Result<bool, AuthError> {
    let page = client
        .get(&listing_path(1))
        .await
        .map_err(|e| AuthError::network("listing probe", e))?;
    Ok(page.is_success() && looks_like_listing(&page.body) && !looks_like_login_prompt(&page.body))
}

fn login_fields(
    credentials: &Credentials,
    token: Option<&AntiForgeryToken>,
    hidden: &[(String, String)],
) -> Vec<(String, String)> {
    let mut fields = vec![
        ("email".to_string(), credentials.email().to_string()),
        ("password".to_string(), credentials.password().to_string()),
        ("remember".to_string(), "on".to_string()),
    ];
    fields.extend(hidden.iter().cloned());
    if let Some(token) = token.filter(|t| t.sent_as_field())
        && !fields.iter().any(|(name, _)| name == TOKEN_FIELD)
    {
        fields.push((TOKEN_FIELD.to_string(), token.value().to_string()));
    }
    fields
}

fn login_headers(
    client: &HttpClient,
    token: Option<&AntiForgeryToken>,
    transport: LoginTransport,
) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    );
    if let Ok(origin) = HeaderValue::from_str(&client.base_url().origin().ascii_serialization()) {
        headers.insert(ORIGIN, origin);
    }
    if let Ok(login_url) = client.url_for(LOGIN_PATH)
        && let Ok(referer) = HeaderValue::from_str(login_url.as_str())
    {
        headers.insert(REFERER, referer);
    }
    if transport == LoginTransport::Json {
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    }
    if let Some(token) = token {
        match HeaderValue::from_str(token.value()) {
            Ok(value) => {
                headers.insert(HeaderName::from_static(token.header_name()), value);
            }
            Err(_) => warn!("anti-forgery token is not a valid header value; sending without it"),
        }
    }
    headers
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use url::Url;

    use super::*;
    use crate::auth::token::TokenSource;

    fn response(final_path: &str, status: u16, ct: &str, body: &str) -> FetchedPage {
        FetchedPage {
            requested_url: Url::parse("https://example.az/account/login").unwrap(),
            final_url: Url::parse("https://example.az").unwrap().join(final_path).unwrap(),
            status,
            content_type: Some(ct.to_string()),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_redirect_away_from_login_is_success() {
        let page = response("/hr/dashboard", 200, "text/html", "<html>Welcome</html>");
        assert_eq!(
            classify_login_response(&page),
            LoginVerdict::Success(LoginEvidence::Redirect {
                location: "/hr/dashboard".to_string()
            })
        );
    }

    #[test]
    fn test_rerendered_login_form_is_failure() {
        let page = response(
            "/account/login",
            200,
            "text/html",
            r#"<form><input type="password" name="password"></form>"#,
        );
        assert_eq!(
            classify_login_response(&page),
            LoginVerdict::Failure("login form re-rendered".to_string())
        );
    }

    #[test]
    fn test_json_success_and_error_payloads() {
        let ok = response("/account/login", 200, "application/json", r#"{"redirect":"/hr"}"#);
        assert_eq!(
            classify_login_response(&ok),
            LoginVerdict::Success(LoginEvidence::JsonSuccess)
        );

        let refused = response(
            "/account/login",
            200,
            "application/json",
            r#"{"success":false,"message":"Yanlış şifrə"}"#,
        );
        assert_eq!(
            classify_login_response(&refused),
            LoginVerdict::Failure("Yanlış şifrə".to_string())
        );

        let validation = response(
            "/account/login",
            422,
            "application/json",
            r#"{"errors":{"email":["required"]}}"#,
        );
        assert!(matches!(
            classify_login_response(&validation),
            LoginVerdict::Failure(_)
        ));
    }

    #[test]
    fn test_error_status_without_payload_is_failure() {
        let page = response("/account/login", 419, "text/html", "Page Expired");
        assert_eq!(
            classify_login_response(&page),
            LoginVerdict::Failure("HTTP 419".to_string())
        );
    }

    #[test]
    fn test_plain_page_is_inconclusive() {
        let page = response("/account/login", 200, "text/html", "<html>ok</html>");
        assert_eq!(classify_login_response(&page), LoginVerdict::Inconclusive);
    }

    #[test]
    fn test_transport_alternates_once() {
        assert_eq!(LoginTransport::Form.alternate(), Some(LoginTransport::Json));
        assert_eq!(LoginTransport::Json.alternate(), None);
        assert_eq!(LoginTransport::Form.to_string(), "form");
    }

    #[test]
    fn test_login_fields_include_page_token_once() {
        let creds = Credentials::new("hr@example.az", "pw").unwrap();
        let token = AntiForgeryToken::new("tok", TokenSource::MetaTag).unwrap();
        let fields = login_fields(&creds, Some(&token), &[]);
        assert_eq!(fields[0], ("email".to_string(), "hr@example.az".to_string()));
        assert_eq!(fields[2], ("remember".to_string(), "on".to_string()));
        assert_eq!(fields.last().unwrap(), &("_token".to_string(), "tok".to_string()));

        let hidden = vec![("_token".to_string(), "tok".to_string())];
        let fields = login_fields(&creds, Some(&token), &hidden);
        assert_eq!(fields.iter().filter(|(name, _)| name == "_token").count(), 1);
    }

    #[test]
    fn test_cookie_token_travels_only_in_header() {
        let creds = Credentials::new("hr@example.az", "pw").unwrap();
        let token = AntiForgeryToken::new("tok", TokenSource::Cookie).unwrap();
        let fields = login_fields(&creds, Some(&token), &[]);
        assert!(fields.iter().all(|(name, _)| name != "_token"));

        let client = HttpClient::new("https://example.az").unwrap();
        let headers = login_headers(&client, Some(&token), LoginTransport::Form);
        let header = |name: &str| headers.get(name).unwrap().to_str().unwrap();
        assert_eq!(header("x-xsrf-token"), "tok");
        assert_eq!(header("origin"), "https://example.az");
        assert_eq!(header("referer"), "https://example.az/account/login");
        assert!(headers.get(ACCEPT).is_none());
    }
}
