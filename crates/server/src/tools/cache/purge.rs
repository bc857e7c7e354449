//! cache_purge tool implementation.
//!
//! Deletes one bucket by name, or every bucket.

use porchlight_client::Worker;
use porchlight_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Full bucket name to delete, e.g. `porchlight-static-v1`.
    pub bucket: Option<String>,

    /// Delete every bucket.
    #[serde(default)]
    pub all: bool,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Names of the deleted buckets.
    pub deleted: Vec<String>,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(worker: &Worker, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let deleted = match (params.bucket, params.all) {
        (Some(_), true) => return Err(Error::InvalidInput("bucket and all are mutually exclusive".into()).into()),
        (Some(name), false) if name.trim().is_empty() => {
            return Err(Error::InvalidInput("bucket cannot be empty".into()).into());
        }
        (Some(name), false) => worker.purge(Some(&name)).await?,
        (None, true) => worker.purge(None).await?,
        (None, false) => return Err(Error::InvalidInput("one of bucket or all must be specified".into()).into()),
    };

    json_result(&CachePurgeOutput { deleted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{parse_output, worker_with};

    #[tokio::test]
    async fn test_purge_one_bucket() {
        let worker = worker_with(&[]).await;
        worker.activate().await.unwrap();

        let params = CachePurgeParams { bucket: Some("porchlight-html-v1".into()), all: false };
        let output: CachePurgeOutput = parse_output(&purge_impl(&worker, params).await.unwrap());
        assert_eq!(output.deleted, vec!["porchlight-html-v1"]);
        assert_eq!(worker.db().bucket_names().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_purge_all() {
        let worker = worker_with(&[]).await;
        worker.activate().await.unwrap();

        let params = CachePurgeParams { bucket: None, all: true };
        let output: CachePurgeOutput = parse_output(&purge_impl(&worker, params).await.unwrap());
        assert_eq!(output.deleted.len(), 3);
    }

    #[tokio::test]
    async fn test_purge_no_params() {
        let worker = worker_with(&[]).await;
        let params = CachePurgeParams { bucket: None, all: false };

        let result = purge_impl(&worker, params).await;
        assert!(result.is_err());
    }
}
