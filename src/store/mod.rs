// src/store/mod.rs

//! Persistence seams for the pipeline.
//!
//! The pipeline only needs a narrow slice of the relational schema: the
//! append-only signature ledger, page writes, and a few site/subscription
//! reads. Both are traits so tests run against the in-memory variants.

pub mod memory;
mod pg;

use std::collections::HashSet;

use async_trait::async_trait;

pub use memory::{MemoryPageStore, MemorySignatureStore};
pub use pg::{PgPageStore, PgSignatureStore};

use crate::error::Result;
use crate::models::{NewPage, PushSubscription, SiteConfig};

/// Append-only ledger of URL signatures.
///
/// Rows are created once and never updated or deleted; uniqueness is
/// enforced by the store, which is what makes cross-cycle dedup correct.
#[async_trait]
pub trait SignatureStore: Send + Sync {
    /// Which of the given signatures are already recorded (one batched
    /// lookup).
    async fn existing(&self, signatures: &[String]) -> Result<HashSet<String>>;

    /// Record a signature. Returns `true` when this call created the row;
    /// `false` means some caller got there first and is never an error.
    async fn insert(&self, signature: &str) -> Result<bool>;
}

/// Read/write access to the entities the pipeline touches.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Content filter keywords for a site, `None` when the site is unknown.
    async fn site_filter_keywords(&self, site_id: i64) -> Result<Option<String>>;

    /// Persist a page together with its content. Returns the page id.
    async fn insert_page(&self, page: &NewPage) -> Result<i64>;

    /// Active push subscriptions for a site.
    async fn subscriptions(&self, site_id: i64) -> Result<Vec<PushSubscription>>;

    /// All configured sites, newest first.
    async fn list_sites(&self) -> Result<Vec<SiteConfig>>;

    /// Stamp a site's last crawl time (clears its first-crawl status).
    async fn mark_crawled(&self, site_id: i64) -> Result<()>;

    /// Domain substrings excluded from crawling and the dedup ledger.
    async fn domain_blacklist(&self) -> Result<Vec<String>>;
}
