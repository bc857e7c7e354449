//! Request classification into cache buckets.
//!
//! Rules, in order:
//! - Only same-origin GET requests are handled.
//! - Static: path ends in a script, stylesheet, image or font extension.
//! - Data: path ends in `.json` or contains `/data/`, ignoring case.
//! - HTML: navigation request, or `Accept` contains `text/html`.
//! - Anything else passes through uncached.

use std::sync::LazyLock;

use porchlight_core::{BucketKind, RequestMode, SiteRequest, WorkerConfig};
use regex::Regex;
use serde::{Deserialize, Serialize};

static STATIC_ASSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(js|mjs|css|png|jpe?g|gif|svg|webp|avif|ico|woff2?|ttf|otf|eot)$")
        .expect("static asset pattern is valid")
});

/// Classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestClass {
    Static,
    Data,
    Html,
    Unhandled,
}

impl RequestClass {
    /// Bucket that stores responses of this class.
    pub fn bucket(self) -> Option<BucketKind> {
        match self {
            RequestClass::Static => Some(BucketKind::Static),
            RequestClass::Data => Some(BucketKind::Data),
            RequestClass::Html => Some(BucketKind::Html),
            RequestClass::Unhandled => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestClass::Static => "static",
            RequestClass::Data => "data",
            RequestClass::Html => "html",
            RequestClass::Unhandled => "unhandled",
        }
    }
}

/// Classify an intercepted request for a worker configured with `config`.
pub fn classify(config: &WorkerConfig, request: &SiteRequest) -> RequestClass {
    if !request.is_get() || !config.is_same_origin(&request.url) {
        return RequestClass::Unhandled;
    }

    let path = request.url.path();

    if STATIC_ASSET.is_match(path) {
        return RequestClass::Static;
    }

    let lower = path.to_ascii_lowercase();
    if lower.ends_with(".json") || lower.contains("/data/") {
        return RequestClass::Data;
    }

    let accepts_html = request.header("accept").is_some_and(|a| a.contains("text/html"));
    if request.mode == RequestMode::Navigate || accepts_html {
        return RequestClass::Html;
    }

    RequestClass::Unhandled
}
