//! Client side of porchlight.
//!
//! This crate provides the HTTP network layer, the cache worker with its
//! per-bucket policies, and the feed loaders shared by the server and CLI.

pub mod feed;
pub mod fetch;
pub mod worker;

pub use feed::{
    Carousel, FeedFile, FeedKind, FeedLoader, FeedOrigin, LoadedFeed, PLACEHOLDERS_PATH, PlaceholderMap, Post, Provenance,
    Review,
};
pub use fetch::{FetchClient, FetchConfig, Network, canonicalize, resolve_target};
pub use worker::{
    ActivateReport, BucketUsage, InstallReport, RequestClass, ResponseSource, Worker, WorkerPhase, WorkerResponse,
    WorkerState, classify,
};
