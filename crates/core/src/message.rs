//! Request and response types routed through the worker.
//!
//! Header names are always stored lowercase so lookups are case-insensitive.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::hash::compute_cache_key;

/// Synthetic header stamped onto every stored response (epoch milliseconds).
pub const CACHED_AT_HEADER: &str = "x-porchlight-cached-at";

/// How the request was issued by the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestMode {
    /// Top-level page navigation.
    Navigate,
    /// Subresource or programmatic fetch.
    #[default]
    Other,
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteRequest {
    pub method: String,
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    pub mode: RequestMode,
}

impl SiteRequest {
    /// A plain GET request.
    pub fn get(url: Url) -> Self {
        Self { method: "GET".into(), url, headers: BTreeMap::new(), mode: RequestMode::Other }
    }

    /// A GET navigation request accepting HTML.
    pub fn navigate(url: Url) -> Self {
        Self::get(url)
            .with_mode(RequestMode::Navigate)
            .with_header("Accept", "text/html,application/xhtml+xml")
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_ascii_uppercase();
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    /// Request identity used as the cache key (method + URL).
    pub fn cache_key(&self) -> String {
        compute_cache_key(&self.method, self.url.as_str())
    }
}

/// A response from the network, the cache, or the worker itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl SiteResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, headers: BTreeMap::new(), body: body.into() }
    }

    /// Synthetic response returned when neither network nor cache can answer.
    pub fn service_unavailable() -> Self {
        Self::new(503, "Service Unavailable").with_header("Content-Type", "text/plain; charset=utf-8")
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// 2xx status, the only responses worth storing.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Stored-at stamp, if this response came out of a bucket.
    pub fn cached_at(&self) -> Option<i64> {
        self.header(CACHED_AT_HEADER).and_then(|v| v.parse().ok())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let req = SiteRequest::get(url("https://example.com/")).with_header("Accept", "text/html");
        assert_eq!(req.header("accept"), Some("text/html"));
        assert_eq!(req.header("ACCEPT"), Some("text/html"));
    }

    #[test]
    fn test_navigate_request() {
        let req = SiteRequest::navigate(url("https://example.com/about.html"));
        assert!(req.is_get());
        assert_eq!(req.mode, RequestMode::Navigate);
        assert!(req.header("accept").unwrap().contains("text/html"));
    }

    #[test]
    fn test_method_is_uppercased() {
        let req = SiteRequest::get(url("https://example.com/contact")).with_method("post");
        assert_eq!(req.method, "POST");
        assert!(!req.is_get());
    }

    #[test]
    fn test_cache_key_depends_on_method() {
        let get = SiteRequest::get(url("https://example.com/contact"));
        let post = get.clone().with_method("POST");
        assert_ne!(get.cache_key(), post.cache_key());
    }

    #[test]
    fn test_success_range() {
        assert!(SiteResponse::new(200, "").is_success());
        assert!(SiteResponse::new(204, "").is_success());
        assert!(!SiteResponse::new(304, "").is_success());
        assert!(!SiteResponse::new(404, "").is_success());
    }

    #[test]
    fn test_service_unavailable() {
        let resp = SiteResponse::service_unavailable();
        assert_eq!(resp.status, 503);
        assert_eq!(resp.content_type(), Some("text/plain; charset=utf-8"));
        assert_eq!(resp.body_text(), "Service Unavailable");
    }

    #[test]
    fn test_cached_at_parse() {
        let resp = SiteResponse::new(200, "x").with_header(CACHED_AT_HEADER, "1700000000000");
        assert_eq!(resp.cached_at(), Some(1_700_000_000_000));
        assert_eq!(SiteResponse::new(200, "x").cached_at(), None);
    }
}
