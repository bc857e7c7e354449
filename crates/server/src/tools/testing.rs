//! Test helpers shared by tool tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use porchlight_client::{Network, Worker};
use porchlight_core::{CacheDb, Error, SiteRequest, SiteResponse, WorkerConfig};
use rmcp::model::CallToolResult;
use serde::de::DeserializeOwned;

/// Fixed responses by URL; `None` means offline.
pub(crate) struct StaticNetwork(pub Option<HashMap<String, SiteResponse>>);

#[async_trait]
impl Network for StaticNetwork {
    async fn fetch(&self, request: &SiteRequest) -> Result<SiteResponse, Error> {
        let Some(pages) = &self.0 else {
            return Err(Error::Network("offline".into()));
        };
        Ok(pages
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| SiteResponse::new(404, "Not Found")))
    }
}

pub(crate) async fn worker_with(pages: &[(&str, &str)]) -> Worker {
    let pages = pages
        .iter()
        .map(|(url, body)| (url.to_string(), SiteResponse::new(200, *body)))
        .collect();
    let db = CacheDb::open_in_memory().await.unwrap();
    let config = WorkerConfig::new(url::Url::parse("https://example.com/").unwrap());
    Worker::new(config, db, Arc::new(StaticNetwork(Some(pages))))
}

pub(crate) fn parse_output<T: DeserializeOwned>(result: &CallToolResult) -> T {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
