//! MCP tool implementations.
//!
//! This module contains all tools exposed by the porchlight server.

pub mod cache;
pub mod site_fetch;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

pub use site_fetch::{SiteFetchParams, fetch_impl};
pub use worker::{activate_impl, install_impl};

/// Serialize a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| porchlight_core::Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
