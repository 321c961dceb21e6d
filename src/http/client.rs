//! Shared HTTP client context: connection pool, cookie store, default headers, timeouts.
//!
//! One `HttpClient` is built per run and cloned into every task. Clones share the
//! same connection pool and the same cookie jar, so cookies set during login are
//! attached to every later request.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Client, ClientBuilder, Proxy, RequestBuilder, Response};
use serde::Serialize;
use tracing::{debug, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::ClientError;
use crate::user_agent;

/// HTTP client bound to one deployment's base URL.
///
/// # Example
///
/// ```no_run
/// use harvester_core::http::HttpClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new("https://www.hellojob.az")?;
/// let page = client.get("/account/login").await?;
/// println!("login page status: {}", page.status);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    jar: Arc<Jar>,
    base_url: Url,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// A fully-read response: status, where redirects ended, and the body text.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL the request was issued for.
    pub requested_url: Url,
    /// URL of the final response after redirects.
    pub final_url: Url,
    /// HTTP status code of the final response.
    pub status: u16,
    /// Content-Type header of the final response, if any.
    pub content_type: Option<String>,
    /// Response body decoded as text.
    pub body: String,
}

impl FetchedPage {
    /// Returns true for 2xx responses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true if the server declared a JSON body.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"))
    }

    /// Returns true if redirects moved the request to a different path.
    #[must_use]
    pub fn was_redirected(&self) -> bool {
        self.final_url.path() != self.requested_url.path()
    }
}

impl HttpClient {
    /// Creates a client for `base_url` with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the base URL is invalid or the client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeouts(base_url, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a client for `base_url` with explicit connect and total timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the base URL is invalid or the client cannot be built.
    #[instrument(level = "debug")]
    pub fn with_timeouts(
        base_url: &str,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, ClientError> {
        let parsed = Url::parse(base_url).map_err(|e| ClientError::invalid_url(base_url, e))?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::invalid_url(
                base_url,
                "expected an http(s) origin",
            ));
        }

        let jar = Arc::new(Jar::default());
        let client = build_client(Arc::clone(&jar), connect_timeout_secs, read_timeout_secs)?;
        debug!(
            base_url = %parsed,
            connect_timeout_secs,
            read_timeout_secs,
            "built HTTP client"
        );

        Ok(Self {
            client,
            jar,
            base_url: parsed,
        })
    }

    /// Returns the deployment root every path is joined onto.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins a site path (optionally with a query) onto the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the join fails.
    pub fn url_for(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::invalid_url(path, e))
    }

    /// Looks up a cookie the jar would send to the base URL.
    ///
    /// Cookie values are sensitive; avoid logging the return value.
    #[must_use]
    pub fn cookie_value(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        let raw = header.to_str().ok()?;
        raw.split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    }

    /// Issues a GET for a site path with the client's default headers.
    ///
    /// Non-2xx statuses are returned as a [`FetchedPage`], not as an error.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on network failure or timeout.
    pub async fn get(&self, path: &str) -> Result<FetchedPage, ClientError> {
        self.get_with_headers(path, HeaderMap::new()).await
    }

    /// Issues a GET with extra per-request headers.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on network failure or timeout.
    #[instrument(level = "debug", skip(self, headers))]
    pub async fn get_with_headers(
        &self,
        path: &str,
        headers: HeaderMap,
    ) -> Result<FetchedPage, ClientError> {
        let url = self.url_for(path)?;
        let request = self.client.get(url.clone()).headers(headers);
        self.send(url, request).await
    }

    /// Issues a form-encoded POST.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on network failure or timeout.
    #[instrument(level = "debug", skip(self, form, headers))]
    pub async fn post_form<T: Serialize + ?Sized>(
        &self,
        path: &str,
        form: &T,
        headers: HeaderMap,
    ) -> Result<FetchedPage, ClientError> {
        let url = self.url_for(path)?;
        let request = self.client.post(url.clone()).headers(headers).form(form);
        self.send(url, request).await
    }

    /// Issues a JSON POST.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on network failure or timeout.
    #[instrument(level = "debug", skip(self, body, headers))]
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        headers: HeaderMap,
    ) -> Result<FetchedPage, ClientError> {
        let url = self.url_for(path)?;
        let request = self.client.post(url.clone()).headers(headers).json(body);
        self.send(url, request).await
    }

    async fn send(&self, url: Url, request: RequestBuilder) -> Result<FetchedPage, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::from_request(url.as_str(), e))?;
        read_page(url, response).await
    }
}

async fn read_page(requested_url: Url, response: Response) -> Result<FetchedPage, ClientError> {
    let status = response.status().as_u16();
    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response
        .text()
        .await
        .map_err(|e| ClientError::from_request(final_url.as_str(), e))?;

    debug!(
        url = %requested_url,
        final_url = %final_url,
        status,
        bytes = body.len(),
        "response received"
    );

    Ok(FetchedPage {
        requested_url,
        final_url,
        status,
        content_type,
        body,
    })
}

fn build_client(
    jar: Arc<Jar>,
    connect_timeout_secs: u64,
    read_timeout_secs: u64,
) -> Result<Client, ClientError> {
    match try_build_client(Arc::clone(&jar), connect_timeout_secs, read_timeout_secs, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some sandboxed environments panic when querying system proxy
            // settings; retry with env-proxy lookup only.
            warn!("HTTP client builder panicked while loading system proxy settings; retrying with env-proxy fallback");
            match try_build_client(jar, connect_timeout_secs, read_timeout_secs, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Build(source)) => Err(ClientError::Build { source }),
                Err(BuildClientFailure::Panic) => Err(ClientError::BuildPanicked),
            }
        }
        Err(BuildClientFailure::Build(source)) => Err(ClientError::Build { source }),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    jar: Arc<Jar>,
    connect_timeout_secs: u64,
    read_timeout_secs: u64,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(jar, connect_timeout_secs, read_timeout_secs);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(jar: Arc<Jar>, connect_timeout_secs: u64, read_timeout_secs: u64) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .timeout(Duration::from_secs(read_timeout_secs))
        .default_headers(user_agent::default_headers())
        .cookie_provider(jar)
        .gzip(true)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    let names: &[&str] = match scheme {
        "https" => &["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"],
        "http" => &["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"],
        _ => return None,
    };
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
