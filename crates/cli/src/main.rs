//! porchlight command line.
//!
//! Each invocation opens the cache database, builds a worker and runs one
//! lifecycle step or request. Logs go to stderr; results go to stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use porchlight_client::{
    Carousel, FeedLoader, FetchClient, FetchConfig, PLACEHOLDERS_PATH, Review, Worker, resolve_target,
};
use porchlight_core::{AppConfig, CacheDb, SiteRequest};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

mod cli;

use cli::{CliArgs, Command, FeedArg};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let log_level = if args.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args)?;
    let worker = build_worker(&config).await?;

    match args.command {
        Command::Install => {
            let report = worker.install().await;
            println!("pages cached:  {}", report.pages_cached);
            println!("assets cached: {}", report.assets_cached);
            for url in &report.failed {
                println!("failed:        {url}");
            }
        }
        Command::Activate => {
            let report = worker.activate().await?;
            for name in &report.deleted_buckets {
                println!("deleted {name}");
            }
            for eviction in report.evictions.iter().filter(|e| e.deleted > 0) {
                println!("{}: evicted {} ({} bytes)", eviction.bucket, eviction.deleted, eviction.freed_bytes);
            }
            println!("activated {}", config.cache_version);
        }
        Command::Fetch { target, navigate, body } => {
            worker.activate().await?;
            let url = resolve_target(&target, worker.config()).with_context(|| format!("invalid target {target}"))?;
            let request = if navigate { SiteRequest::navigate(url) } else { SiteRequest::get(url) };
            let url = request.url.to_string();
            let handled = worker.handle(request).await?;

            println!(
                "{} {} {} {}",
                handled.response.status,
                handled.class.as_str(),
                handled.source.as_str(),
                url
            );
            if body {
                println!("{}", handled.response.body_text());
            }
            if let Some(revalidation) = handled.revalidation {
                revalidation.await.context("background revalidation panicked")?;
            }
        }
        Command::Stats => {
            for usage in worker.stats().await? {
                println!(
                    "{:<28} {:>6} entries {:>12} / {:>12} bytes",
                    usage.stats.name, usage.stats.entries, usage.stats.total_bytes, usage.budget
                );
            }
        }
        Command::Purge { bucket } => {
            let deleted = worker.purge(bucket.as_deref()).await?;
            if deleted.is_empty() {
                println!("nothing to purge");
            }
            for name in deleted {
                println!("deleted {name}");
            }
        }
        Command::Feed { kind, page, per_page } => {
            worker.activate().await?;
            let loader = FeedLoader::new(worker.clone());
            let html = match kind {
                FeedArg::Reviews => {
                    let loaded = loader.reviews(Vec::new()).await;
                    let mut carousel = Carousel::new(loaded.feed.items, per_page);
                    carousel.go_to_page(page);
                    carousel.render(Review::card_html)
                }
                FeedArg::Posts => {
                    let loaded = loader.posts(Vec::new()).await;
                    let placeholders = loader.placeholders(PLACEHOLDERS_PATH).await;
                    let mut carousel = Carousel::new(loaded.feed.items, per_page);
                    carousel.go_to_page(page);
                    carousel.render(|post| post.card_html_with(placeholders.for_image(&post.image_url)))
                }
            };
            println!("{html}");
        }
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let mut config = AppConfig::load().context("failed to load configuration")?;
    if let Some(db) = &args.db {
        config.db_path = db.clone();
    }
    if let Some(scope) = &args.scope {
        config.scope = scope.clone();
        config.validate()?;
    }
    Ok(config)
}

async fn build_worker(config: &AppConfig) -> Result<Worker> {
    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open cache at {}", config.db_path.display()))?;
    let network = FetchClient::new(FetchConfig::from_app_config(config))?;
    Ok(Worker::new(config.worker_config()?, db, Arc::new(network)))
}
