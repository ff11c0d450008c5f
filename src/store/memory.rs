// src/store/memory.rs

//! In-memory stores.
//!
//! Back the unit tests and make the dedup/notify engines runnable without a
//! database. Mutations go through a single mutex per store, which gives the
//! same at-most-one-winner insert semantics the Postgres unique constraint
//! provides.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{NewPage, PushSubscription, SiteConfig};

use super::{PageStore, SignatureStore};

/// Signature ledger held in a mutex-guarded set.
#[derive(Default)]
pub struct MemorySignatureStore {
    seen: Mutex<HashSet<String>>,
}

impl MemorySignatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl SignatureStore for MemorySignatureStore {
    async fn existing(&self, signatures: &[String]) -> Result<HashSet<String>> {
        let seen = self.seen.lock().unwrap();
        Ok(signatures
            .iter()
            .filter(|s| seen.contains(*s))
            .cloned()
            .collect())
    }

    async fn insert(&self, signature: &str) -> Result<bool> {
        Ok(self.seen.lock().unwrap().insert(signature.to_string()))
    }
}

/// In-memory page/site/subscription store.
#[derive(Default)]
pub struct MemoryPageStore {
    inner: Mutex<MemoryPageStoreInner>,
}

#[derive(Default)]
struct MemoryPageStoreInner {
    sites: Vec<SiteConfig>,
    pages: Vec<NewPage>,
    subscriptions: Vec<PushSubscription>,
    blacklist: Vec<String>,
    crawled: HashMap<i64, bool>,
    next_page_id: i64,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_site(&self, site: SiteConfig) {
        self.inner.lock().unwrap().sites.push(site);
    }

    pub fn add_subscription(&self, sub: PushSubscription) {
        self.inner.lock().unwrap().subscriptions.push(sub);
    }

    pub fn add_blacklist_domain(&self, domain: impl Into<String>) {
        self.inner.lock().unwrap().blacklist.push(domain.into());
    }

    /// Pages persisted so far.
    pub fn pages(&self) -> Vec<NewPage> {
        self.inner.lock().unwrap().pages.clone()
    }

    pub fn was_marked_crawled(&self, site_id: i64) -> bool {
        self.inner
            .lock()
            .unwrap()
            .crawled
            .get(&site_id)
            .copied()
            .unwrap_or(false)
    }
}

#[async_trait]
impl PageStore for MemoryPageStore {
    async fn site_filter_keywords(&self, site_id: i64) -> Result<Option<String>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .sites
            .iter()
            .find(|s| s.id == site_id)
            .map(|s| s.content_filter_keywords.clone()))
    }

    async fn insert_page(&self, page: &NewPage) -> Result<i64> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_page_id += 1;
        inner.pages.push(page.clone());
        Ok(inner.next_page_id)
    }

    async fn subscriptions(&self, site_id: i64) -> Result<Vec<PushSubscription>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .subscriptions
            .iter()
            .filter(|s| s.site_id == site_id)
            .cloned()
            .collect())
    }

    async fn list_sites(&self) -> Result<Vec<SiteConfig>> {
        let mut sites = self.inner.lock().unwrap().sites.clone();
        sites.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(sites)
    }

    async fn mark_crawled(&self, site_id: i64) -> Result<()> {
        self.inner.lock().unwrap().crawled.insert(site_id, true);
        Ok(())
    }

    async fn domain_blacklist(&self) -> Result<Vec<String>> {
        Ok(self.inner.lock().unwrap().blacklist.clone())
    }
}
