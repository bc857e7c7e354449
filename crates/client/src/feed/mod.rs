//! Review and post feeds.
//!
//! Feed files are produced by the site build and served as JSON under the
//! data path. They are read through the worker so the Data bucket policy
//! applies; anything unusable degrades to the caller's manual items.

pub mod carousel;
pub mod placeholders;

use std::fmt;

use chrono::{DateTime, Utc};
use porchlight_core::{Error, SiteRequest};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use carousel::Carousel;
pub use placeholders::PlaceholderMap;

use crate::worker::Worker;

/// Who produced a feed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Provenance {
    /// Hand-maintained content.
    Manual,
    /// Pulled from an external API, tagged with its name.
    Api(String),
}

impl From<String> for Provenance {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("manual") { Provenance::Manual } else { Provenance::Api(value) }
    }
}

impl From<Provenance> for String {
    fn from(value: Provenance) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Manual => f.write_str("manual"),
            Provenance::Api(tag) => f.write_str(tag),
        }
    }
}

/// On-disk feed layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedFile<T> {
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
    pub source: Provenance,
    pub items: Vec<T>,
}

impl<T> FeedFile<T> {
    pub fn manual(items: Vec<T>) -> Self {
        Self { last_updated: Utc::now(), source: Provenance::Manual, items }
    }
}

/// A customer testimonial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub author: String,
    /// Star rating, 1 to 5.
    pub rating: u8,
    pub text: String,
    pub date: String,
}

impl Review {
    pub fn is_valid(&self) -> bool {
        (1..=5).contains(&self.rating) && !self.author.trim().is_empty()
    }

    pub fn card_html(&self) -> String {
        let stars: String = "★".repeat(self.rating as usize) + &"☆".repeat(5usize.saturating_sub(self.rating as usize));
        format!(
            "<article class=\"review-card\"><div class=\"review-rating\" aria-label=\"{} out of 5\">{}</div>\
             <blockquote>{}</blockquote><footer>{} <time>{}</time></footer></article>",
            self.rating,
            stars,
            escape_html(&self.text),
            escape_html(&self.author),
            escape_html(&self.date)
        )
    }
}

/// A social media post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub caption: String,
    pub image_url: String,
    pub permalink: String,
}

impl Post {
    pub fn card_html(&self) -> String {
        self.card_html_with(None)
    }

    /// Render with an optional blur placeholder shown behind the image until it loads.
    pub fn card_html_with(&self, placeholder: Option<&str>) -> String {
        let style = placeholder
            .map(|data| format!(" style=\"background-image: url('{}'); background-size: cover\"", escape_html(data)))
            .unwrap_or_default();
        format!(
            "<article class=\"post-card\"><a href=\"{}\" rel=\"noopener\"><img src=\"{}\" alt=\"{}\" loading=\"lazy\"{}></a>\
             <p>{}</p></article>",
            escape_html(&self.permalink),
            escape_html(&self.image_url),
            escape_html(&self.caption),
            style,
            escape_html(&self.caption)
        )
    }
}

pub(crate) fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Image placeholder map, under the base path.
pub const PLACEHOLDERS_PATH: &str = "data/placeholders.json";

/// The two feeds the site publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Reviews,
    Posts,
}

impl FeedKind {
    /// Path under the base path.
    pub fn path(self) -> &'static str {
        match self {
            FeedKind::Reviews => "data/reviews.json",
            FeedKind::Posts => "data/instagram.json",
        }
    }
}

/// Where loaded feed items came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedOrigin {
    Remote,
    ManualFallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedFeed<T> {
    pub feed: FeedFile<T>,
    pub origin: FeedOrigin,
}

/// Reads feed files through the worker's Data bucket.
#[derive(Clone)]
pub struct FeedLoader {
    worker: Worker,
}

impl FeedLoader {
    pub fn new(worker: Worker) -> Self {
        Self { worker }
    }

    /// Load a feed, falling back to `manual` when it can't be used.
    pub async fn load<T: DeserializeOwned>(&self, path: &str, manual: Vec<T>) -> LoadedFeed<T> {
        match self.fetch_json::<FeedFile<T>>(path).await {
            Ok(feed) if !feed.items.is_empty() => {
                tracing::debug!(path = %path, items = feed.items.len(), source = %feed.source, "loaded feed");
                LoadedFeed { feed, origin: FeedOrigin::Remote }
            }
            Ok(_) => {
                tracing::warn!(path = %path, "feed has no items, using manual content");
                LoadedFeed { feed: FeedFile::manual(manual), origin: FeedOrigin::ManualFallback }
            }
            Err(e) => {
                tracing::warn!(path = %path, "feed unavailable, using manual content: {}", e);
                LoadedFeed { feed: FeedFile::manual(manual), origin: FeedOrigin::ManualFallback }
            }
        }
    }

    /// Load reviews, dropping records with an out-of-range rating or no author.
    pub async fn reviews(&self, manual: Vec<Review>) -> LoadedFeed<Review> {
        let mut loaded = self.load(FeedKind::Reviews.path(), manual).await;
        let before = loaded.feed.items.len();
        loaded.feed.items.retain(Review::is_valid);
        if loaded.feed.items.len() != before {
            tracing::warn!(dropped = before - loaded.feed.items.len(), "dropped malformed reviews");
        }
        loaded
    }

    pub async fn posts(&self, manual: Vec<Post>) -> LoadedFeed<Post> {
        self.load(FeedKind::Posts.path(), manual).await
    }

    /// Load the image placeholder map; an unusable map is empty.
    pub async fn placeholders(&self, path: &str) -> PlaceholderMap {
        match self.fetch_json(path).await {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(path = %path, "placeholder map unavailable: {}", e);
                PlaceholderMap::default()
            }
        }
    }

    async fn fetch_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.worker.config().resolve(path)?;
        let handled = self.worker.handle(SiteRequest::get(url)).await?;
        if !handled.response.is_success() {
            return Err(Error::HttpError(format!("{path}: status {}", handled.response.status)));
        }
        Ok(serde_json::from_slice(&handled.response.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::testing::FakeNetwork;
    use crate::worker::ResponseSource;
    use porchlight_core::{BucketKind, CacheDb, WorkerConfig};
    use std::sync::Arc;
    use url::Url;

    const REVIEWS: &str = r#"{
        "lastUpdated": "2026-03-01T12:00:00Z",
        "source": "google-places",
        "items": [
            {"author": "Dana", "rating": 5, "text": "Great work", "date": "2026-02-20"},
            {"author": "Sam", "rating": 9, "text": "Broken rating", "date": "2026-02-21"}
        ]
    }"#;

    fn manual_reviews() -> Vec<Review> {
        vec![Review { author: "Office".into(), rating: 5, text: "Call us".into(), date: "2025-01-01".into() }]
    }

    async fn loader() -> (FeedLoader, Arc<FakeNetwork>) {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network = Arc::new(FakeNetwork::new());
        let worker = Worker::new(WorkerConfig::new(Url::parse("https://example.com/").unwrap()), db, network.clone());
        worker.activate().await.unwrap();
        (FeedLoader::new(worker), network)
    }

    #[test]
    fn test_provenance_serde() {
        let manual: Provenance = serde_json::from_str("\"manual\"").unwrap();
        assert_eq!(manual, Provenance::Manual);
        let api: Provenance = serde_json::from_str("\"instagram-graph\"").unwrap();
        assert_eq!(api, Provenance::Api("instagram-graph".into()));
        assert_eq!(serde_json::to_string(&Provenance::Manual).unwrap(), "\"manual\"");
    }

    #[test]
    fn test_feed_file_parses() {
        let feed: FeedFile<Review> = serde_json::from_str(REVIEWS).unwrap();
        assert_eq!(feed.items.len(), 2);
        assert_eq!(feed.source, Provenance::Api("google-places".into()));
        assert_eq!(feed.last_updated.to_rfc3339(), "2026-03-01T12:00:00+00:00");
    }

    #[test]
    fn test_review_card_escapes() {
        let review = Review { author: "<b>".into(), rating: 3, text: "a & b".into(), date: "today".into() };
        let html = review.card_html();
        assert!(html.contains("&lt;b&gt;"));
        assert!(html.contains("a &amp; b"));
        assert!(html.contains("★★★☆☆"));
    }

    #[test]
    fn test_post_card_placeholder() {
        let post = Post {
            id: "1".into(),
            caption: "Spring".into(),
            image_url: "assets/images/hero-640.webp".into(),
            permalink: "https://instagram.com/p/1".into(),
        };
        let map = PlaceholderMap::from_json(r#"{"hero": "data:image/webp;base64,AAAA"}"#).unwrap();

        let html = post.card_html_with(map.for_image(&post.image_url));
        assert!(html.contains("loading=\"lazy\" style=\"background-image: url('data:image/webp;base64,AAAA')"));
        assert!(!post.card_html().contains("background-image"));
    }

    #[tokio::test]
    async fn test_load_reviews_filters_invalid() {
        let (loader, network) = loader().await;
        network.serve("https://example.com/data/reviews.json", 200, REVIEWS);

        let loaded = loader.reviews(manual_reviews()).await;
        assert_eq!(loaded.origin, FeedOrigin::Remote);
        assert_eq!(loaded.feed.items.len(), 1);
        assert_eq!(loaded.feed.items[0].author, "Dana");
    }

    #[tokio::test]
    async fn test_load_reads_through_data_bucket() {
        let (loader, network) = loader().await;
        network.serve("https://example.com/data/reviews.json", 200, REVIEWS);

        loader.reviews(manual_reviews()).await;
        network.set_online(false);
        let loaded = loader.reviews(manual_reviews()).await;
        assert_eq!(loaded.origin, FeedOrigin::Remote);
        assert_eq!(network.calls(), 1);

        let req = SiteRequest::get(Url::parse("https://example.com/data/reviews.json").unwrap());
        assert!(loader.worker.lookup(BucketKind::Data, &req).await.unwrap().is_some());
        let handled = loader.worker.handle(req).await.unwrap();
        assert_eq!(handled.source, ResponseSource::Cache);
    }

    #[tokio::test]
    async fn test_malformed_feed_falls_back_to_manual() {
        let (loader, network) = loader().await;
        network.serve("https://example.com/data/reviews.json", 200, "{not json");

        let loaded = loader.reviews(manual_reviews()).await;
        assert_eq!(loaded.origin, FeedOrigin::ManualFallback);
        assert_eq!(loaded.feed.source, Provenance::Manual);
        assert_eq!(loaded.feed.items, manual_reviews());
    }

    #[tokio::test]
    async fn test_missing_feed_falls_back_to_manual() {
        let (loader, _network) = loader().await;
        let loaded = loader.posts(Vec::new()).await;
        assert_eq!(loaded.origin, FeedOrigin::ManualFallback);
        assert!(loaded.feed.items.is_empty());
    }

    #[tokio::test]
    async fn test_offline_uncached_feed_falls_back_to_manual() {
        let (loader, network) = loader().await;
        network.set_online(false);
        let loaded = loader.reviews(manual_reviews()).await;
        assert_eq!(loaded.origin, FeedOrigin::ManualFallback);
        assert_eq!(loaded.feed.items.len(), 1);
    }

    #[tokio::test]
    async fn test_load_placeholders() {
        let (loader, network) = loader().await;
        network.serve(
            "https://example.com/data/placeholders.json",
            200,
            r#"{"hero": "data:image/webp;base64,AAAA"}"#,
        );

        let map = loader.placeholders(PLACEHOLDERS_PATH).await;
        assert_eq!(map.get("hero"), Some("data:image/webp;base64,AAAA"));

        let missing = loader.placeholders("data/none.json").await;
        assert!(missing.is_empty());
    }
}
