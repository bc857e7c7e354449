//! Explicit worker configuration: bucket names, budgets and precache lists.

use std::time::Duration;

use url::Url;

use crate::cache::BucketKind;
use crate::Error;

pub const DEFAULT_CACHE_PREFIX: &str = "porchlight";
pub const DEFAULT_CACHE_VERSION: &str = "v1";
pub const DEFAULT_STATIC_BUDGET: u64 = 50 * 1024 * 1024;
pub const DEFAULT_HTML_BUDGET: u64 = 10 * 1024 * 1024;
pub const DEFAULT_DATA_BUDGET: u64 = 5 * 1024 * 1024;
pub const DEFAULT_DATA_MAX_AGE: Duration = Duration::from_secs(60 * 60);

pub fn default_critical_pages() -> Vec<String> {
    ["", "index.html", "about.html", "services.html", "contact.html"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn default_critical_assets() -> Vec<String> {
    ["assets/css/main.css", "assets/js/main.js", "assets/images/logo.png"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Configuration values the worker reads instead of module-level constants.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    /// Registration scope; its origin is the only origin the worker caches,
    /// and its path is the deployed base path.
    pub scope: Url,
    pub cache_prefix: String,
    pub cache_version: String,
    pub static_budget: u64,
    pub html_budget: u64,
    pub data_budget: u64,
    /// Data entries older than this are refetched before being served.
    pub data_max_age: Duration,
    /// Page paths relative to the base path, precached into the HTML bucket.
    pub critical_pages: Vec<String>,
    /// Asset paths relative to the base path, precached into the Static bucket.
    pub critical_assets: Vec<String>,
}

impl WorkerConfig {
    pub fn new(scope: Url) -> Self {
        Self {
            scope,
            cache_prefix: DEFAULT_CACHE_PREFIX.into(),
            cache_version: DEFAULT_CACHE_VERSION.into(),
            static_budget: DEFAULT_STATIC_BUDGET,
            html_budget: DEFAULT_HTML_BUDGET,
            data_budget: DEFAULT_DATA_BUDGET,
            data_max_age: DEFAULT_DATA_MAX_AGE,
            critical_pages: default_critical_pages(),
            critical_assets: default_critical_assets(),
        }
    }

    /// Versioned bucket name, e.g. `porchlight-static-v1`.
    pub fn bucket_name(&self, kind: BucketKind) -> String {
        format!("{}-{}-{}", self.cache_prefix, kind.as_str(), self.cache_version)
    }

    pub fn budget(&self, kind: BucketKind) -> u64 {
        match kind {
            BucketKind::Static => self.static_budget,
            BucketKind::Data => self.data_budget,
            BucketKind::Html => self.html_budget,
        }
    }

    pub fn current_bucket_names(&self) -> Vec<String> {
        BucketKind::ALL.iter().map(|k| self.bucket_name(*k)).collect()
    }

    /// Path of the scope, always ending in `/`.
    pub fn base_path(&self) -> String {
        let path = self.scope.path();
        if path.ends_with('/') { path.to_string() } else { format!("{path}/") }
    }

    /// Resolve a path relative to the base path into an absolute URL.
    pub fn resolve(&self, path: &str) -> Result<Url, Error> {
        let full = format!("{}{}", self.base_path(), path.trim_start_matches('/'));
        self.scope
            .join(&full)
            .map_err(|e| Error::InvalidUrl(format!("{full}: {e}")))
    }

    /// Page served when offline and the requested page isn't cached.
    pub fn index_fallback(&self) -> Result<Url, Error> {
        self.resolve("index.html")
    }

    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.scope.origin()
    }
}
