// src/dedup.rs

//! URL deduplication engine.
//!
//! Guarantees at-most-once downstream processing per distinct URL: every URL
//! is hashed to a 128-bit signature and checked against the append-only
//! ledger. Blacklisted domains are filtered before a signature is ever
//! computed, keeping them out of the ledger entirely.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::store::{PageStore, SignatureStore};

/// Content-addressed signature of a URL string.
///
/// Deterministic and stable: the md5 hex digest of the exact string, no
/// further normalization.
pub fn signature(url: &str) -> String {
    format!("{:x}", md5::compute(url.as_bytes()))
}

/// True when the URL contains any blacklisted domain substring.
pub fn is_blacklisted(url: &str, blacklist: &[String]) -> bool {
    blacklist.iter().any(|domain| url.contains(domain))
}

/// Dedup engine over a signature ledger.
pub struct DedupEngine {
    store: Arc<dyn SignatureStore>,
}

impl DedupEngine {
    pub fn new(store: Arc<dyn SignatureStore>) -> Self {
        Self { store }
    }

    /// Return the subset of `urls` never seen before and durably record that
    /// subset as now-seen.
    ///
    /// The ledger's uniqueness constraint decides races: an insert that
    /// loses reads as "not new", so across concurrent callers at most one
    /// result set contains a given URL.
    pub async fn filter_new(&self, urls: Vec<String>, blacklist: &[String]) -> Result<Vec<String>> {
        let candidates: Vec<(String, String)> = urls
            .into_iter()
            .filter(|url| !is_blacklisted(url, blacklist))
            .map(|url| {
                let sig = signature(&url);
                (url, sig)
            })
            .collect();

        let signatures: Vec<String> = candidates.iter().map(|(_, s)| s.clone()).collect();
        let existing = self.store.existing(&signatures).await?;

        let mut fresh = Vec::new();
        for (url, sig) in candidates {
            if existing.contains(&sig) {
                continue;
            }
            if self.store.insert(&sig).await? {
                fresh.push(url);
            }
        }
        Ok(fresh)
    }

    /// Report which of `urls` have never been recorded, without recording
    /// anything. Backs the admin bulk dedup check.
    pub async fn check_only(&self, urls: &[String], blacklist: &[String]) -> Result<Vec<String>> {
        let candidates: Vec<(String, String)> = urls
            .iter()
            .filter(|url| !is_blacklisted(url, blacklist))
            .map(|url| (url.clone(), signature(url)))
            .collect();

        let signatures: Vec<String> = candidates.iter().map(|(_, s)| s.clone()).collect();
        let existing = self.store.existing(&signatures).await?;

        Ok(candidates
            .into_iter()
            .filter(|(_, sig)| !existing.contains(sig))
            .map(|(url, _)| url)
            .collect())
    }
}

/// List-stage seam: filter a candidate set down to never-seen URLs,
/// committing them as seen.
#[async_trait]
pub trait Deduplicator: Send + Sync {
    async fn filter_new(&self, urls: Vec<String>) -> Result<Vec<String>>;
}

/// Local engine variant: ledger and blacklist live in this process's store.
pub struct LocalDedup {
    engine: DedupEngine,
    pages: Arc<dyn PageStore>,
}

impl LocalDedup {
    pub fn new(store: Arc<dyn SignatureStore>, pages: Arc<dyn PageStore>) -> Self {
        Self {
            engine: DedupEngine::new(store),
            pages,
        }
    }
}

#[async_trait]
impl Deduplicator for LocalDedup {
    async fn filter_new(&self, urls: Vec<String>) -> Result<Vec<String>> {
        let blacklist = self.pages.domain_blacklist().await?;
        self.engine.filter_new(urls, &blacklist).await
    }
}

/// Remote dedup service variant, the default worker deployment.
///
/// Posts the candidate list as a JSON array; the service answers with the
/// surviving subset in its response envelope. A service failure yields an
/// empty surviving set so the cycle ends quietly for that site.
pub struct HttpDedup {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpDedup {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[derive(serde::Deserialize)]
struct DedupResponse {
    data: Vec<String>,
}

#[async_trait]
impl Deduplicator for HttpDedup {
    async fn filter_new(&self, urls: Vec<String>) -> Result<Vec<String>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&urls)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        match response {
            Ok(response) => {
                let body: DedupResponse = response.json().await?;
                Ok(body.data)
            }
            Err(error) => {
                warn!(endpoint = %self.endpoint, %error, "dedup service call failed");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::{MemoryPageStore, MemorySignatureStore};

    fn engine() -> (DedupEngine, Arc<MemorySignatureStore>) {
        let store = Arc::new(MemorySignatureStore::new());
        (DedupEngine::new(store.clone()), store)
    }

    #[test]
    fn test_signature_deterministic() {
        let url = "https://example.com/news/1";
        assert_eq!(signature(url), signature(url));
        assert_eq!(signature(url).len(), 32);
        assert_ne!(signature(url), signature("https://example.com/news/2"));
    }

    #[tokio::test]
    async fn test_filter_new_idempotent_suppression() {
        let (engine, _) = engine();
        let urls = vec![
            "https://a.com/1".to_string(),
            "https://a.com/2".to_string(),
        ];

        let first = engine.filter_new(urls.clone(), &[]).await.unwrap();
        assert_eq!(first.len(), 2);

        let second = engine.filter_new(urls, &[]).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_filter_new_blacklist_first() {
        let (engine, store) = engine();
        let blacklist = vec!["ads.example.com".to_string()];
        let urls = vec![
            "https://ads.example.com/track".to_string(),
            "https://news.example.com/1".to_string(),
        ];

        let fresh = engine.filter_new(urls, &blacklist).await.unwrap();
        assert_eq!(fresh, vec!["https://news.example.com/1".to_string()]);
        // The blacklisted URL never reached the ledger.
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_local_dedup_applies_store_blacklist() {
        let signatures = Arc::new(MemorySignatureStore::new());
        let pages = Arc::new(MemoryPageStore::new());
        pages.add_blacklist_domain("ads.example.com");
        let dedup = LocalDedup::new(signatures.clone(), pages);

        let fresh = dedup
            .filter_new(vec![
                "https://ads.example.com/track".to_string(),
                "https://news.example.com/1".to_string(),
            ])
            .await
            .unwrap();

        assert_eq!(fresh, vec!["https://news.example.com/1".to_string()]);
        assert_eq!(signatures.len(), 1);
    }

    #[tokio::test]
    async fn test_check_only_records_nothing() {
        let (engine, store) = engine();
        let urls = vec!["https://a.com/1".to_string()];

        let unseen = engine.check_only(&urls, &[]).await.unwrap();
        assert_eq!(unseen.len(), 1);
        assert!(store.is_empty());

        // Still unseen on the second check.
        let unseen = engine.check_only(&urls, &[]).await.unwrap();
        assert_eq!(unseen.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicates_have_one_winner() {
        let store = Arc::new(MemorySignatureStore::new());
        let url = "https://a.com/contested".to_string();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let url = url.clone();
            handles.push(tokio::spawn(async move {
                let engine = DedupEngine::new(store);
                engine.filter_new(vec![url], &[]).await.unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if !handle.await.unwrap().is_empty() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
