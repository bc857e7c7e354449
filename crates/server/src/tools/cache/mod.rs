//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting and clearing the worker's buckets.

pub mod get;
pub mod purge;
pub mod stats;

pub use get::{CacheGetParams, get_impl};
pub use purge::{CachePurgeParams, purge_impl};
pub use stats::stats_impl;
