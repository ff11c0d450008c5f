// src/fetch/mod.rs

//! Page fetching capabilities.
//!
//! Each crawl type maps to a [`Fetcher`] implementation; the pipeline
//! dispatches through a small registry instead of branching on the enum, so
//! a new crawl type only needs a new registry entry.

mod browser;
mod http;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Semaphore, SemaphorePermit};

pub use browser::RenderFetcher;
pub use http::HttpFetcher;

use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::models::CrawlType;

/// A fetched page body, HTML or JSON text depending on the fetcher.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub body: String,
}

/// Capability to turn a URL into a raw page.
///
/// Every implementation must bound its work with a timeout; a timeout is a
/// plain fetch failure, not a distinct condition.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<RawPage>;
}

/// Caps the number of in-flight fetches across every fetcher sharing it,
/// so a large schedule fan-out never opens unbounded connections.
#[derive(Clone)]
pub struct FetchLimiter {
    permits: Arc<Semaphore>,
}

impl FetchLimiter {
    pub fn new(limit: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(limit)),
        }
    }

    /// Wait for a fetch slot; the permit is held for the whole request.
    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>> {
        self.permits
            .acquire()
            .await
            .map_err(|e| AppError::config(format!("fetch limiter: {e}")))
    }
}

/// Registry mapping crawl types to fetchers.
pub struct FetcherRegistry {
    fetchers: HashMap<CrawlType, Arc<dyn Fetcher>>,
}

impl FetcherRegistry {
    pub fn new() -> Self {
        Self {
            fetchers: HashMap::new(),
        }
    }

    pub fn register(mut self, crawl_type: CrawlType, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetchers.insert(crawl_type, fetcher);
        self
    }

    /// Look up the fetcher for a crawl type; a missing entry is a
    /// configuration error.
    pub fn get(&self, crawl_type: CrawlType) -> Result<&Arc<dyn Fetcher>> {
        self.fetchers.get(&crawl_type).ok_or_else(|| {
            AppError::config(format!(
                "no fetcher registered for crawl type '{}'",
                crawl_type.as_str()
            ))
        })
    }

    /// Build the default registry from settings: plain HTTP for static and
    /// JSON pages, the rendering service for dynamic ones. Both share one
    /// fetch limiter sized by `fetch_conn_limit`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .pool_max_idle_per_host(settings.fetch_conn_limit)
            .build()?;
        let limiter = FetchLimiter::new(settings.fetch_conn_limit);

        let http: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(client.clone(), limiter.clone()));
        let render: Arc<dyn Fetcher> = Arc::new(RenderFetcher::new(
            client,
            &settings.render_url,
            settings.render_token.as_deref(),
            limiter,
        ));

        Ok(Self::new()
            .register(CrawlType::HtmlStatic, http.clone())
            .register(CrawlType::Json, http)
            .register(CrawlType::HtmlDynamic, render))
    }
}

impl Default for FetcherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedFetcher;

    #[async_trait]
    impl Fetcher for FixedFetcher {
        async fn fetch(&self, _url: &str) -> Result<RawPage> {
            Ok(RawPage {
                body: "ok".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_registry_dispatch() {
        let registry =
            FetcherRegistry::new().register(CrawlType::HtmlStatic, Arc::new(FixedFetcher));

        let page = registry
            .get(CrawlType::HtmlStatic)
            .unwrap()
            .fetch("https://example.com")
            .await
            .unwrap();
        assert_eq!(page.body, "ok");

        assert!(registry.get(CrawlType::HtmlDynamic).is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_limiter_caps_in_flight_fetches() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let limiter = FetchLimiter::new(2);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let limiter = limiter.clone();
            let active = active.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                let _permit = limiter.acquire().await.unwrap();
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }
}
