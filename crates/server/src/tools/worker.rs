//! worker_install and worker_activate tool implementations.

use porchlight_client::Worker;
use porchlight_core::EvictionReport;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Output from the worker_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallOutput {
    pub version: String,
    pub pages_cached: usize,
    pub assets_cached: usize,
    /// URLs that could not be precached.
    pub failed: Vec<String>,
}

/// Output from the worker_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ActivateOutput {
    pub version: String,
    pub deleted_buckets: Vec<String>,
    pub evictions: Vec<EvictionReport>,
    pub claimed: bool,
}

pub async fn install_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let report = worker.install().await;
    json_result(&InstallOutput {
        version: worker.config().cache_version.clone(),
        pages_cached: report.pages_cached,
        assets_cached: report.assets_cached,
        failed: report.failed,
    })
}

pub async fn activate_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let report = worker.activate().await?;
    json_result(&ActivateOutput {
        version: worker.config().cache_version.clone(),
        deleted_buckets: report.deleted_buckets,
        evictions: report.evictions,
        claimed: worker.state().await.claimed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{parse_output, worker_with};

    #[tokio::test]
    async fn test_install_then_activate() {
        let worker = worker_with(&[
            ("https://example.com/", "home"),
            ("https://example.com/index.html", "home"),
            ("https://example.com/assets/js/main.js", "js"),
        ])
        .await;

        let install: InstallOutput = parse_output(&install_impl(&worker).await.unwrap());
        assert_eq!(install.pages_cached, 2);
        assert_eq!(install.assets_cached, 1);
        assert_eq!(install.failed.len(), 5);

        let activate: ActivateOutput = parse_output(&activate_impl(&worker).await.unwrap());
        assert!(activate.claimed);
        assert!(activate.deleted_buckets.is_empty());
        assert_eq!(activate.evictions.len(), 3);
        assert!(activate.evictions.iter().all(|e| e.deleted == 0));
    }
}
