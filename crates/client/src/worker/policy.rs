//! Per-bucket cache policies.
//!
//! - Static: cache-first, stale-while-revalidate.
//! - Data: served from cache with no network call while younger than the
//!   staleness window, otherwise refetched first. A failed refetch serves the
//!   stale copy.
//! - HTML: network-first, falling back to the exact cached page, then the
//!   index page, then a synthetic 503.
//!
//! Every successful write is followed by budget enforcement on its bucket.

use std::sync::Arc;
use std::time::Duration;

use porchlight_core::{CacheDb, Error, SiteRequest, SiteResponse};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use url::Url;

use crate::fetch::Network;

/// Where a worker response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
    /// Cached copy past its staleness window, served because the network failed.
    StaleCache,
    /// The index page, served for an uncached page while offline.
    Fallback,
    /// Generated by the worker.
    Synthetic,
}

impl ResponseSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::StaleCache => "stale_cache",
            ResponseSource::Fallback => "fallback",
            ResponseSource::Synthetic => "synthetic",
        }
    }
}

/// Result of running a policy.
#[derive(Debug)]
pub struct PolicyOutcome {
    pub response: SiteResponse,
    pub source: ResponseSource,
    /// Background refresh started after serving from cache.
    pub revalidation: Option<JoinHandle<()>>,
}

impl PolicyOutcome {
    fn new(response: SiteResponse, source: ResponseSource) -> Self {
        Self { response, source, revalidation: None }
    }
}

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// One bucket plus the network it refills from.
#[derive(Clone)]
pub(crate) struct BucketStore {
    pub(crate) db: CacheDb,
    pub(crate) network: Arc<dyn Network>,
    pub(crate) bucket: String,
    pub(crate) budget: u64,
}

impl BucketStore {
    /// Store the response, then trim the bucket to its budget.
    pub(crate) async fn write(&self, request: &SiteRequest, response: &SiteResponse) -> Result<(), Error> {
        self.db.put_entry(&self.bucket, request, response, now_ms()).await?;
        let report = self.db.enforce_budget(&self.bucket, self.budget).await?;
        if report.deleted > 0 {
            tracing::debug!(
                bucket = %self.bucket,
                deleted = report.deleted,
                freed_bytes = report.freed_bytes,
                remaining_bytes = report.remaining_bytes,
                "evicted entries over budget"
            );
        }
        Ok(())
    }

    /// Fetch and store only 2xx responses.
    async fn fetch_and_store(&self, request: &SiteRequest) -> Result<SiteResponse, Error> {
        let response = self.network.fetch(request).await?;
        if response.is_success() {
            self.write(request, &response).await?;
        }
        Ok(response)
    }

    /// Refresh the entry in the background; failures are only logged.
    fn revalidate(&self, request: &SiteRequest) -> JoinHandle<()> {
        let store = self.clone();
        let request = request.clone();
        tokio::spawn(async move {
            match store.fetch_and_store(&request).await {
                Ok(response) => {
                    tracing::debug!(bucket = %store.bucket, url = %request.url, status = response.status, "revalidated")
                }
                Err(e) => tracing::debug!(bucket = %store.bucket, url = %request.url, "revalidation failed: {}", e),
            }
        })
    }
}

/// How a cache-first bucket keeps its hits current.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Freshness {
    /// Serve any hit, then refresh it in the background.
    Revalidate,
    /// Serve hits younger than the window with no network call; refetch older ones first.
    MaxAge(Duration),
}

/// Cache-first lookup under the given freshness rule.
pub(crate) async fn cache_first(
    store: &BucketStore, request: &SiteRequest, freshness: Freshness,
) -> Result<PolicyOutcome, Error> {
    let cached = store.db.match_entry(&store.bucket, request).await?;

    let mut stale_entry = None;
    if let Some(entry) = cached {
        let age = entry.age_ms(now_ms());
        let stale = match freshness {
            Freshness::Revalidate => false,
            Freshness::MaxAge(max) => age as u128 > max.as_millis(),
        };
        if !stale {
            tracing::debug!(bucket = %store.bucket, url = %request.url, age_ms = age, "cache hit");
            let revalidation = match freshness {
                Freshness::Revalidate => Some(store.revalidate(request)),
                Freshness::MaxAge(_) => None,
            };
            return Ok(PolicyOutcome { response: entry.into_response(), source: ResponseSource::Cache, revalidation });
        }
        tracing::debug!(bucket = %store.bucket, url = %request.url, age_ms = age, "cache entry stale");
        stale_entry = Some(entry);
    } else {
        tracing::debug!(bucket = %store.bucket, url = %request.url, "cache miss");
    }

    match store.fetch_and_store(request).await {
        Ok(response) => Ok(PolicyOutcome::new(response, ResponseSource::Network)),
        Err(e) => match stale_entry {
            Some(entry) => {
                tracing::warn!(url = %request.url, "refetch failed, serving stale entry: {}", e);
                Ok(PolicyOutcome::new(entry.into_response(), ResponseSource::StaleCache))
            }
            None => Err(e),
        },
    }
}

/// Network-first with cache, index-page and synthetic 503 fallbacks.
pub(crate) async fn network_first(
    store: &BucketStore, request: &SiteRequest, index_fallback: &Url,
) -> Result<PolicyOutcome, Error> {
    let error = match store.network.fetch(request).await {
        Ok(response) => {
            if response.is_success() {
                store.write(request, &response).await?;
            }
            return Ok(PolicyOutcome::new(response, ResponseSource::Network));
        }
        Err(e) => e,
    };

    tracing::debug!(url = %request.url, "network failed, trying cache: {}", error);

    if let Some(entry) = store.db.match_entry(&store.bucket, request).await? {
        return Ok(PolicyOutcome::new(entry.into_response(), ResponseSource::Cache));
    }

    let index_request = SiteRequest::get(index_fallback.clone());
    if let Some(entry) = store.db.match_entry(&store.bucket, &index_request).await? {
        tracing::debug!(url = %request.url, fallback = %index_fallback, "serving index fallback");
        return Ok(PolicyOutcome::new(entry.into_response(), ResponseSource::Fallback));
    }

    tracing::warn!(url = %request.url, "offline with no cached page or fallback");
    Ok(PolicyOutcome::new(SiteResponse::service_unavailable(), ResponseSource::Synthetic))
}
