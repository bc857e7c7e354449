//! cache_stats tool implementation.

use porchlight_client::Worker;
use porchlight_core::BucketKind;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BucketReport {
    pub kind: BucketKind,
    pub name: String,
    pub entries: u64,
    pub total_bytes: u64,
    pub budget_bytes: u64,
    pub oldest_stored_at: Option<i64>,
    pub newest_stored_at: Option<i64>,
}

/// Output from the cache_stats tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatsOutput {
    pub version: String,
    pub phase: String,
    pub claimed: bool,
    pub buckets: Vec<BucketReport>,
    /// Buckets from other versions, deleted on the next activation.
    pub outdated_buckets: Vec<String>,
}

/// Implementation of the cache_stats tool.
pub async fn stats_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let buckets = worker
        .stats()
        .await?
        .into_iter()
        .map(|usage| BucketReport {
            kind: usage.kind,
            name: usage.stats.name,
            entries: usage.stats.entries,
            total_bytes: usage.stats.total_bytes,
            budget_bytes: usage.budget,
            oldest_stored_at: usage.stats.oldest_stored_at,
            newest_stored_at: usage.stats.newest_stored_at,
        })
        .collect();

    let current = worker.config().current_bucket_names();
    let outdated_buckets = worker
        .db()
        .bucket_names()
        .await?
        .into_iter()
        .filter(|name| !current.contains(name))
        .collect();

    let state = worker.state().await;
    let output = CacheStatsOutput {
        version: worker.config().cache_version.clone(),
        phase: format!("{:?}", state.phase).to_lowercase(),
        claimed: state.claimed,
        buckets,
        outdated_buckets,
    };

    json_result(&output)
}
