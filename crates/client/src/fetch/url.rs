//! URL canonicalization and target resolution against the worker scope.

use porchlight_core::WorkerConfig;

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("outside the worker origin: {0}")]
    CrossOrigin(String),
}

/// Canonicalize an absolute URL string so equal pages share one cache key.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let mut parsed = url::Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str().map(str::to_lowercase) {
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Turn user input into a request URL.
///
/// Absolute URLs are canonicalized and must share the worker's origin;
/// anything else is a path under the worker's base path (`about.html` with
/// scope `/site/` -> `/site/about.html`).
pub fn resolve_target(input: &str, config: &WorkerConfig) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.contains("://") {
        let url = canonicalize(trimmed)?;
        if !config.is_same_origin(&url) {
            return Err(UrlError::CrossOrigin(url.to_string()));
        }
        return Ok(url);
    }

    let mut resolved = config.resolve(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    resolved.set_fragment(None);
    Ok(resolved)
}
