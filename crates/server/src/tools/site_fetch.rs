//! site_fetch tool implementation.
//!
//! Routes a request through the worker, so the bucket policies decide
//! whether it is answered from cache or network.

use porchlight_client::{Worker, resolve_target};
use porchlight_core::{Error, RequestMode, SiteRequest};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for the site_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SiteFetchParams {
    /// Absolute URL on the site origin, or a path relative to the site base path.
    pub target: String,

    /// Treat the request as a page navigation.
    #[serde(default)]
    pub navigate: bool,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Optional Accept header.
    #[serde(default)]
    pub accept: Option<String>,

    /// Maximum characters of body text to return (default: 20000).
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_max_chars() -> usize {
    20_000
}

/// Output structure for the site_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SiteFetchOutput {
    pub url: String,
    /// Request class: static, data, html or unhandled.
    pub class: String,
    /// network, cache, stale_cache, fallback or synthetic.
    pub source: String,
    pub status: u16,
    pub content_type: Option<String>,
    /// Epoch milliseconds when the served copy was stored, if it came from cache.
    pub cached_at: Option<i64>,
    pub body_bytes: usize,
    pub body: String,
    pub truncated: bool,
}

pub(crate) fn build_request(worker: &Worker, params: &SiteFetchParams) -> Result<SiteRequest, Error> {
    if params.target.trim().is_empty() {
        return Err(Error::InvalidInput("target cannot be empty".into()));
    }

    let url = resolve_target(&params.target, worker.config()).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let mut request = if params.navigate { SiteRequest::navigate(url) } else { SiteRequest::get(url) };
    if let Some(method) = params.method.as_deref() {
        request = request.with_method(method);
    }
    if let Some(accept) = params.accept.as_deref() {
        request = request.with_header("accept", accept);
    }
    Ok(request)
}

/// Implementation of the site_fetch tool.
pub async fn fetch_impl(worker: &Worker, params: SiteFetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(worker, &params)?;
    let url = request.url.to_string();
    let navigate = request.mode == RequestMode::Navigate;

    let handled = worker.handle(request).await?;
    tracing::debug!(url = %url, navigate, source = handled.source.as_str(), "site_fetch");

    let text = handled.response.body_text();
    let truncated = text.chars().count() > params.max_chars;
    let body = if truncated { text.chars().take(params.max_chars).collect() } else { text };

    let output = SiteFetchOutput {
        url,
        class: handled.class.as_str().to_string(),
        source: handled.source.as_str().to_string(),
        status: handled.response.status,
        content_type: handled.response.content_type().map(str::to_string),
        cached_at: handled.response.cached_at(),
        body_bytes: handled.response.body.len(),
        body,
        truncated,
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{parse_output, worker_with};

    fn params(target: &str) -> SiteFetchParams {
        SiteFetchParams {
            target: target.into(),
            navigate: false,
            method: None,
            accept: None,
            max_chars: default_max_chars(),
        }
    }

    #[tokio::test]
    async fn test_fetch_empty_target() {
        let worker = worker_with(&[]).await;
        assert!(fetch_impl(&worker, params("  ")).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_rejects_other_origin() {
        let worker = worker_with(&[("http://169.254.169.254/latest/meta-data", "secret")]).await;
        worker.activate().await.unwrap();

        let err = fetch_impl(&worker, params("http://169.254.169.254/latest/meta-data"))
            .await
            .unwrap_err();
        assert_eq!(err.code.0, -32003);
        assert!(!err.message.contains("secret"));
    }

    #[tokio::test]
    async fn test_fetch_passthrough_before_activate() {
        let worker = worker_with(&[("https://example.com/assets/app.js", "js")]).await;

        let result = fetch_impl(&worker, params("assets/app.js")).await.unwrap();
        let output: SiteFetchOutput = parse_output(&result);
        assert_eq!(output.class, "unhandled");
        assert_eq!(output.source, "network");
        assert_eq!(output.body, "js");
    }

    #[tokio::test]
    async fn test_fetch_static_cached_second_time() {
        let worker = worker_with(&[("https://example.com/assets/app.js", "console.log(1)")]).await;
        worker.activate().await.unwrap();

        fetch_impl(&worker, params("assets/app.js")).await.unwrap();
        let result = fetch_impl(&worker, params("https://example.com/assets/app.js")).await.unwrap();
        let output: SiteFetchOutput = parse_output(&result);
        assert_eq!(output.class, "static");
        assert_eq!(output.source, "cache");
        assert!(output.cached_at.is_some());
    }

    #[tokio::test]
    async fn test_fetch_truncates_body() {
        let worker = worker_with(&[("https://example.com/about.html", "0123456789")]).await;
        worker.activate().await.unwrap();

        let mut p = params("about.html");
        p.navigate = true;
        p.max_chars = 4;
        let output: SiteFetchOutput = parse_output(&fetch_impl(&worker, p).await.unwrap());
        assert_eq!(output.class, "html");
        assert_eq!(output.body, "0123");
        assert!(output.truncated);
        assert_eq!(output.body_bytes, 10);
    }

    #[tokio::test]
    async fn test_build_request_method_and_accept() {
        let worker = worker_with(&[]).await;
        let mut p = params("contact");
        p.method = Some("post".into());
        p.accept = Some("text/html".into());
        let request = build_request(&worker, &p).unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.header("accept"), Some("text/html"));
        assert_eq!(request.url.as_str(), "https://example.com/contact");
    }
}
