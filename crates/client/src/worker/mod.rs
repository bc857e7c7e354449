//! Offline-first cache worker.
//!
//! The worker fronts one origin. Requests are classified into Static, Data
//! or HTML buckets and answered by the matching policy in [`policy`];
//! everything else passes straight through to the network.
//!
//! ### Lifecycle
//! - **install**: precache critical pages and assets under the base path.
//!   Individual failures are logged and skipped.
//! - **activate**: delete buckets from other versions, trim the current
//!   buckets to budget, then claim clients.
//!
//! Until it has claimed clients the worker does not touch the cache.

pub mod classify;
pub mod policy;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use porchlight_core::{
    BucketKind, BucketStats, CacheDb, CachedEntry, Error, EvictionReport, SiteRequest, SiteResponse, WorkerConfig,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

pub use classify::{RequestClass, classify};
pub use policy::{PolicyOutcome, ResponseSource};

use crate::fetch::Network;
use policy::{BucketStore, Freshness};

/// Lifecycle phase, following the service worker state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerPhase {
    #[default]
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
}

/// Mutable worker state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerState {
    pub phase: WorkerPhase,
    /// Whether the worker controls requests (clients claimed).
    pub claimed: bool,
}

/// A response produced by [`Worker::handle`].
#[derive(Debug)]
pub struct WorkerResponse {
    pub class: RequestClass,
    pub response: SiteResponse,
    pub source: ResponseSource,
    pub revalidation: Option<JoinHandle<()>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReport {
    pub pages_cached: usize,
    pub assets_cached: usize,
    /// URLs that could not be precached.
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateReport {
    pub deleted_buckets: Vec<String>,
    pub evictions: Vec<EvictionReport>,
}

/// Stats for one current bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketUsage {
    pub kind: BucketKind,
    pub budget: u64,
    #[serde(flatten)]
    pub stats: BucketStats,
}

/// The cache worker. Cloning shares cache, network and state.
#[derive(Clone)]
pub struct Worker {
    config: Arc<WorkerConfig>,
    db: CacheDb,
    network: Arc<dyn Network>,
    state: Arc<RwLock<WorkerState>>,
}

impl Worker {
    pub fn new(config: WorkerConfig, db: CacheDb, network: Arc<dyn Network>) -> Self {
        Self { config: Arc::new(config), db, network, state: Arc::new(RwLock::new(WorkerState::default())) }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub async fn state(&self) -> WorkerState {
        self.state.read().await.clone()
    }

    fn store(&self, kind: BucketKind) -> BucketStore {
        BucketStore {
            db: self.db.clone(),
            network: Arc::clone(&self.network),
            bucket: self.config.bucket_name(kind),
            budget: self.config.budget(kind),
        }
    }

    async fn set_phase(&self, phase: WorkerPhase) {
        let mut state = self.state.write().await;
        state.phase = phase;
        tracing::info!(phase = ?phase, version = %self.config.cache_version, "worker lifecycle");
    }

    /// Precache critical pages and assets. Never fails.
    ///
    /// A freshly installed worker waits for [`Worker::activate`] before it
    /// controls requests again.
    pub async fn install(&self) -> InstallReport {
        self.set_phase(WorkerPhase::Installing).await;
        self.state.write().await.claimed = false;

        let mut report = InstallReport::default();
        let (pages, failed_pages) = self.precache(BucketKind::Html, &self.config.critical_pages).await;
        let (assets, failed_assets) = self.precache(BucketKind::Static, &self.config.critical_assets).await;
        report.pages_cached = pages;
        report.assets_cached = assets;
        report.failed.extend(failed_pages);
        report.failed.extend(failed_assets);

        self.set_phase(WorkerPhase::Installed).await;
        tracing::info!(
            pages = report.pages_cached,
            assets = report.assets_cached,
            failed = report.failed.len(),
            "install complete"
        );
        report
    }

    async fn precache(&self, kind: BucketKind, paths: &[String]) -> (usize, Vec<String>) {
        let store = self.store(kind);
        let mut cached = 0;
        let mut failed = Vec::new();

        for path in paths {
            let url = match self.config.resolve(path) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(path = %path, "skipping precache entry: {}", e);
                    failed.push(path.clone());
                    continue;
                }
            };
            let request = match kind {
                BucketKind::Html => SiteRequest::navigate(url),
                _ => SiteRequest::get(url),
            };

            let result = match self.network.fetch(&request).await {
                Ok(response) if response.is_success() => store.write(&request, &response).await,
                Ok(response) => Err(Error::HttpError(format!("status {}", response.status))),
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => cached += 1,
                Err(e) => {
                    tracing::warn!(url = %request.url, bucket = %kind, "failed to precache: {}", e);
                    failed.push(request.url.to_string());
                }
            }
        }

        (cached, failed)
    }

    /// Drop buckets from other versions, enforce budgets, claim clients.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.set_phase(WorkerPhase::Activating).await;

        let current = self.config.current_bucket_names();
        let mut report = ActivateReport::default();

        for name in self.db.bucket_names().await? {
            if !current.contains(&name) {
                self.db.delete_bucket(&name).await?;
                tracing::info!(bucket = %name, "deleted outdated bucket");
                report.deleted_buckets.push(name);
            }
        }

        for kind in BucketKind::ALL {
            let name = self.config.bucket_name(kind);
            self.db.open_bucket(&name).await?;
            report.evictions.push(self.db.enforce_budget(&name, self.config.budget(kind)).await?);
        }

        {
            let mut state = self.state.write().await;
            state.phase = WorkerPhase::Activated;
            state.claimed = true;
        }
        tracing::info!(deleted = report.deleted_buckets.len(), "worker activated and claimed clients");

        Ok(report)
    }

    /// Answer an intercepted request.
    pub async fn handle(&self, request: SiteRequest) -> Result<WorkerResponse, Error> {
        let claimed = self.state.read().await.claimed;
        let class = if claimed { classify(&self.config, &request) } else { RequestClass::Unhandled };

        let Some(kind) = class.bucket() else {
            if !claimed {
                tracing::debug!(url = %request.url, "worker not active, passing through");
            }
            let response = self.network.fetch(&request).await?;
            return Ok(WorkerResponse { class, response, source: ResponseSource::Network, revalidation: None });
        };

        let store = self.store(kind);
        let outcome = match kind {
            BucketKind::Static => policy::cache_first(&store, &request, Freshness::Revalidate).await?,
            BucketKind::Data => {
                policy::cache_first(&store, &request, Freshness::MaxAge(self.config.data_max_age)).await?
            }
            BucketKind::Html => policy::network_first(&store, &request, &self.config.index_fallback()?).await?,
        };

        tracing::debug!(
            url = %request.url,
            class = class.as_str(),
            source = outcome.source.as_str(),
            status = outcome.response.status,
            "handled request"
        );

        Ok(WorkerResponse {
            class,
            response: outcome.response,
            source: outcome.source,
            revalidation: outcome.revalidation,
        })
    }

    /// Look up the stored entry for a request in one of the current buckets.
    pub async fn lookup(&self, kind: BucketKind, request: &SiteRequest) -> Result<Option<CachedEntry>, Error> {
        self.db.match_entry(&self.config.bucket_name(kind), request).await
    }

    /// Size and age of each current bucket.
    pub async fn stats(&self) -> Result<Vec<BucketUsage>, Error> {
        let mut usage = Vec::with_capacity(BucketKind::ALL.len());
        for kind in BucketKind::ALL {
            let stats = self.db.bucket_stats(&self.config.bucket_name(kind)).await?;
            usage.push(BucketUsage { kind, budget: self.config.budget(kind), stats });
        }
        Ok(usage)
    }

    /// Delete one bucket by name, or every bucket when `bucket` is None.
    ///
    /// Returns the names that were deleted.
    pub async fn purge(&self, bucket: Option<&str>) -> Result<Vec<String>, Error> {
        let targets = match bucket {
            Some(name) => vec![name.to_string()],
            None => self.db.bucket_names().await?,
        };

        let mut deleted = Vec::new();
        for name in targets {
            if self.db.delete_bucket(&name).await? {
                deleted.push(name);
            }
        }
        tracing::info!(count = deleted.len(), "purged buckets");
        Ok(deleted)
    }
}
