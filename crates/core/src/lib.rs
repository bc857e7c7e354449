//! Core types and shared functionality for porchlight.
//!
//! This crate provides:
//! - Bucketed response cache with SQLite backend
//! - Request/response types shared by the worker and its network layer
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod message;

pub use cache::{BucketKind, BucketStats, CacheDb, CachedEntry, EntryMeta, EvictionReport};
pub use config::{AppConfig, ConfigError, WorkerConfig};
pub use error::Error;
pub use message::{CACHED_AT_HEADER, RequestMode, SiteRequest, SiteResponse};
