//! cache_get tool implementation.
//!
//! Retrieves a stored entry from one of the current buckets, by request
//! target or by key hash.

use std::collections::BTreeMap;

use porchlight_client::{Worker, resolve_target};
use porchlight_core::{BucketKind, CachedEntry, Error, SiteRequest};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Bucket to read: static, data or html.
    pub bucket: BucketKind,

    /// Absolute URL or path under the base path.
    #[serde(default)]
    pub target: Option<String>,

    /// HTTP method of the stored request (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Key hash of the entry, used instead of `target`.
    #[serde(default)]
    pub hash: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub bucket: String,
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub size: u64,
    pub stored_at: i64,
    pub age_ms: i64,
    pub body: String,
}

impl From<CachedEntry> for CacheGetOutput {
    fn from(entry: CachedEntry) -> Self {
        let age_ms = entry.age_ms(chrono::Utc::now().timestamp_millis());
        Self {
            bucket: entry.bucket,
            key_hash: entry.key_hash,
            method: entry.method,
            url: entry.url,
            status: entry.status,
            headers: entry.headers,
            size: entry.size,
            stored_at: entry.stored_at,
            age_ms,
            body: String::from_utf8_lossy(&entry.body).into_owned(),
        }
    }
}

/// Implementation of the cache_get tool.
pub async fn get_impl(worker: &Worker, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let bucket = worker.config().bucket_name(params.bucket);

    let (entry, label) = match (params.hash, params.target) {
        (Some(hash), _) => (worker.db().get_entry(&bucket, &hash).await?, hash),
        (None, Some(target)) => {
            let url = resolve_target(&target, worker.config()).map_err(|e| Error::InvalidUrl(e.to_string()))?;
            let mut request = SiteRequest::get(url);
            if let Some(method) = params.method.as_deref() {
                request = request.with_method(method);
            }
            (worker.lookup(params.bucket, &request).await?, request.url.to_string())
        }
        (None, None) => return Err(Error::InvalidInput("one of target or hash must be specified".into()).into()),
    };

    let entry = entry.ok_or_else(|| Error::CacheMiss(format!("{bucket}: {label}")))?;
    json_result(&CacheGetOutput::from(entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{parse_output, worker_with};

    #[tokio::test]
    async fn test_get_impl_missing() {
        let worker = worker_with(&[]).await;
        let params =
            CacheGetParams { bucket: BucketKind::Static, target: Some("assets/none.css".into()), method: None, hash: None };

        let result = get_impl(&worker, params).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_get_impl_needs_target_or_hash() {
        let worker = worker_with(&[]).await;
        let params = CacheGetParams { bucket: BucketKind::Html, target: None, method: None, hash: None };
        assert!(get_impl(&worker, params).await.is_err());
    }

    #[tokio::test]
    async fn test_get_impl_invalid_hash() {
        let worker = worker_with(&[]).await;
        let params = CacheGetParams { bucket: BucketKind::Html, target: None, method: None, hash: Some("xyz".into()) };
        let err = get_impl(&worker, params).await.unwrap_err();
        assert_eq!(err.code.0, -32002);
    }

    #[tokio::test]
    async fn test_get_impl_found() {
        let worker = worker_with(&[("https://example.com/assets/site.css", "body{}")]).await;
        worker.activate().await.unwrap();
        let request = SiteRequest::get(url::Url::parse("https://example.com/assets/site.css").unwrap());
        worker.handle(request.clone()).await.unwrap();

        let params =
            CacheGetParams { bucket: BucketKind::Static, target: Some("assets/site.css".into()), method: None, hash: None };
        let output: CacheGetOutput = parse_output(&get_impl(&worker, params).await.unwrap());
        assert_eq!(output.body, "body{}");
        assert_eq!(output.bucket, "porchlight-static-v1");
        assert!(output.headers.contains_key("x-porchlight-cached-at"));

        let params =
            CacheGetParams { bucket: BucketKind::Static, target: None, method: None, hash: Some(request.cache_key()) };
        let by_hash: CacheGetOutput = parse_output(&get_impl(&worker, params).await.unwrap());
        assert_eq!(by_hash.url, output.url);
    }
}
