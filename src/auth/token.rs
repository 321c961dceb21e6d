//! Anti-forgery token discovery on the login page.
//!
//! The deployment uses a double-submit scheme: the same token is set as a cookie
//! and must be echoed back in a request header. Some page states embed the token
//! in a `<meta>` tag or a hidden `_token` input instead. All sources are optional.

use std::fmt;
use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::markup::compile_static_selector;

static META_TOKEN_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(r#"meta[name="csrf-token"]"#));
static HIDDEN_TOKEN_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(r#"input[name="_token"]"#));
static FORM_SELECTOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("form"));
static PASSWORD_INPUT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(r#"input[name="password"]"#));
static HIDDEN_INPUT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(r#"input[type="hidden"][name]"#));

/// Form field carrying a page-embedded token.
pub const TOKEN_FIELD: &str = "_token";

/// Fields the login payload always sets itself.
const CREDENTIAL_FIELDS: [&str; 3] = ["email", "password", "remember"];

/// Where a token was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// The `XSRF-TOKEN` cookie (URL-decoded).
    Cookie,
    /// A `<meta name="csrf-token">` tag.
    MetaTag,
    /// A hidden `_token` form input.
    HiddenField,
}

/// A discovered anti-forgery token. The value is redacted in Debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct AntiForgeryToken {
    value: String,
    source: TokenSource,
}

impl AntiForgeryToken {
    /// Creates a token; blank values yield `None`.
    #[must_use]
    pub fn new(value: impl Into<String>, source: TokenSource) -> Option<Self> {
        let value = value.into().trim().to_string();
        (!value.is_empty()).then_some(Self { value, source })
    }

    /// Returns the token value. Never log the return value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns where the token was found.
    #[must_use]
    pub fn source(&self) -> TokenSource {
        self.source
    }

    /// Request header (lowercase) that mirrors the token.
    #[must_use]
    pub fn header_name(&self) -> &'static str {
        match self.source {
            TokenSource::Cookie => "x-xsrf-token",
            TokenSource::MetaTag | TokenSource::HiddenField => "x-csrf-token",
        }
    }

    /// Returns true if the token should also travel as the `_token` body field.
    #[must_use]
    pub fn sent_as_field(&self) -> bool {
        self.source != TokenSource::Cookie
    }
}

impl fmt::Debug for AntiForgeryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AntiForgeryToken")
            .field("source", &self.source)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Picks the token to echo: cookie first, then meta tag, then hidden input.
///
/// `raw_cookie` is the cookie value as stored in the jar (percent-encoded).
#[must_use]
pub fn discover_token(raw_cookie: Option<&str>, login_markup: &str) -> Option<AntiForgeryToken> {
    if let Some(raw) = raw_cookie {
        let decoded = urlencoding::decode(raw)
            .map(|value| value.into_owned())
            .unwrap_or_else(|_| raw.to_string());
        if let Some(token) = AntiForgeryToken::new(decoded, TokenSource::Cookie) {
            return Some(token);
        }
    }

    let document = Html::parse_document(login_markup);
    let meta = document
        .select(&META_TOKEN_SELECTOR)
        .find_map(|el| el.value().attr("content"))
        .and_then(|value| AntiForgeryToken::new(value, TokenSource::MetaTag));
    if meta.is_some() {
        return meta;
    }
    document
        .select(&HIDDEN_TOKEN_SELECTOR)
        .find_map(|el| el.value().attr("value"))
        .and_then(|value| AntiForgeryToken::new(value, TokenSource::HiddenField))
}

/// Hidden inputs of the login form, excluding the credential fields.
///
/// The login form is the first form containing a password input; when none
/// does, the first form on the page is used.
#[must_use]
pub fn hidden_login_fields(login_markup: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(login_markup);
    let mut forms = document.select(&FORM_SELECTOR).peekable();
    let first = forms.peek().copied();
    let Some(form) = forms
        .find(|form| form.select(&PASSWORD_INPUT_SELECTOR).next().is_some())
        .or(first)
    else {
        return Vec::new();
    };

    let mut fields: Vec<(String, String)> = Vec::new();
    for input in form.select(&HIDDEN_INPUT_SELECTOR) {
        let Some(name) = input.value().attr("name") else {
            continue;
        };
        if name.is_empty()
            || CREDENTIAL_FIELDS.contains(&name)
            || fields.iter().any(|(existing, _)| existing == name)
        {
            continue;
        }
        let value = input.value().attr("value").unwrap_or_default();
        fields.push((name.to_string(), value.to_string()));
    }
    fields
}
