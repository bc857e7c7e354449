//! SQLite-backed response cache partitioned into named buckets.
//!
//! This module provides a persistent request/response store using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Named buckets whose names carry the deployment version
//! - Request identity keys using SHA-256 hashing
//! - Automatic schema migrations
//! - Byte-budget eviction, oldest stored-at first

pub mod bucket;
pub mod connection;
pub mod entries;
pub mod eviction;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use bucket::BucketKind;
pub use connection::CacheDb;
pub use entries::{CachedEntry, EntryMeta};
pub use eviction::{BucketStats, EvictionReport};
