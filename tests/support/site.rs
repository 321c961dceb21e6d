//! Canned cv-pool markup and mock mounting helpers shared by integration tests.

#![allow(dead_code)]

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PAGE_TOKEN: &str = "page-token-123";

/// Percent-encoded cookie value; decodes to `cookie-token=`.
pub const COOKIE_TOKEN_RAW: &str = "cookie-token%3D";
pub const COOKIE_TOKEN: &str = "cookie-token=";

pub fn login_page() -> String {
    format!(
        r#"<html><head><meta name="csrf-token" content="{PAGE_TOKEN}"></head>
<body>
  <form method="post" action="/account/login">
    <input type="hidden" name="_token" value="{PAGE_TOKEN}">
    <input type="hidden" name="redirect_to" value="/hr/cv-pool">
    <input type="email" name="email">
    <input type="password" name="password">
  </form>
</body></html>"#
    )
}

pub fn listing_item(id: &str, name: &str, age: u8) -> String {
    format!(
        r#"<div class="vacancies__item" data-id="{id}">
  <a class="vacancies__title" href="/hr/cv-pool/cv/{id}">Backend Developer</a>
  <div class="vacancies__company">{name} ({age})</div>
  <ul class="vacancies__info">
    <li><svg class="svg-pin"></svg> Bakı </li>
    <li>1500 AZN</li>
    <li>85% tamamlandı</li>
  </ul>
</div>"#
    )
}

/// A listing page with numbered pagination links up to `last_page`.
pub fn listing_page(items: &[String], last_page: u32) -> String {
    let links: String = (1..=last_page)
        .map(|n| format!(r#"<li><a href="/hr/cv-pool?page={n}">{n}</a></li>"#))
        .collect();
    format!(
        r#"<html><body><div class="vacancies">{}</div><ul class="pagination">{links}</ul></body></html>"#,
        items.join("\n")
    )
}

pub fn items(ids: impl IntoIterator<Item = u32>) -> Vec<String> {
    ids.into_iter()
        .map(|id| listing_item(&id.to_string(), &format!("Namizəd {id}"), 30))
        .collect()
}

pub async fn mount_home(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>home</html>"))
        .mount(server)
        .await;
}

pub async fn mount_login_page(server: &MockServer, with_cookie: bool) {
    let mut response = ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(login_page());
    if with_cookie {
        response = response.insert_header(
            "set-cookie",
            format!("XSRF-TOKEN={COOKIE_TOKEN_RAW}; Path=/").as_str(),
        );
    }
    Mock::given(method("GET"))
        .and(path("/account/login"))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Form login that redirects to the listing.
pub async fn mount_redirecting_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/account/login"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/hr/cv-pool"))
        .mount(server)
        .await;
}

/// Page 1 of the listing (no `page` query).
pub async fn mount_first_listing_page(server: &MockServer, body: String) {
    Mock::given(method("GET"))
        .and(path("/hr/cv-pool"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

/// Page `n` (> 1) of the listing. Takes priority over the page-1 mock.
pub async fn mount_listing_page(server: &MockServer, n: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/hr/cv-pool"))
        .and(query_param("page", n.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(body),
        )
        .with_priority(1)
        .mount(server)
        .await;
}

pub async fn mount_phone(server: &MockServer, id: &str, phone: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/hr/cv-pool/cv/{id}/show-phone")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "error": false, "phone": phone })),
        )
        .mount(server)
        .await;
}

pub async fn mount_withheld_phone(server: &MockServer, id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/hr/cv-pool/cv/{id}/show-phone")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "error": true })))
        .mount(server)
        .await;
}

/// Show-phone endpoint answering with a bare status and no payload.
pub async fn mount_phone_status(server: &MockServer, id: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/hr/cv-pool/cv/{id}/show-phone")))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
