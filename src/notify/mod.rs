// src/notify/mod.rs

//! Notification filter engine.
//!
//! Consumes terminal `PageContentResult`s: decides site-level visibility,
//! summarizes and persists visible pages, and evaluates per-subscriber push
//! eligibility (keyword filter plus quiet-hours policy).

mod keywords;
mod quiet;

pub use keywords::is_hit_keywords;
pub use quiet::QuietHours;

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Local};
use tracing::{error, info, warn};

use crate::dedup::signature;
use crate::error::Result;
use crate::models::{NewPage, PageContentResult};
use crate::services::{PAYWALL_SUMMARY, PushRequest, PushSender, Summarizer};
use crate::store::PageStore;

/// How one content result was resolved.
#[derive(Debug, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Page persisted; `pushes` outbound requests were sent
    Persisted { page_id: i64, pushes: usize },
    /// Site keyword filter missed (or the site is unknown); nothing stored
    Filtered,
}

/// Engine consuming `crawl.pagecontent` messages.
pub struct NotifyEngine {
    store: Arc<dyn PageStore>,
    summarizer: Arc<dyn Summarizer>,
    pusher: Arc<dyn PushSender>,
    quiet_hours: QuietHours,
}

impl NotifyEngine {
    pub fn new(
        store: Arc<dyn PageStore>,
        summarizer: Arc<dyn Summarizer>,
        pusher: Arc<dyn PushSender>,
        quiet_hours: QuietHours,
    ) -> Self {
        Self {
            store,
            summarizer,
            pusher,
            quiet_hours,
        }
    }

    /// Handle one content result at the current wall-clock time.
    pub async fn handle(&self, result: &PageContentResult) -> Result<NotifyOutcome> {
        self.handle_at(result, &Local::now()).await
    }

    /// Handle one content result; the evaluation time is injected so the
    /// quiet-hours policy is testable.
    pub async fn handle_at(
        &self,
        result: &PageContentResult,
        now: &DateTime<Local>,
    ) -> Result<NotifyOutcome> {
        let Some(site_keywords) = self.store.site_filter_keywords(result.site_id).await? else {
            warn!(site_id = result.site_id, "content result for unknown site");
            return Ok(NotifyOutcome::Filtered);
        };

        if !is_hit_keywords(&result.title, &result.content, &site_keywords) {
            return Ok(NotifyOutcome::Filtered);
        }

        let summary = if result.paywall {
            PAYWALL_SUMMARY.to_string()
        } else {
            self.summarizer
                .summarize(&result.title, &result.content)
                .await?
        };

        let display_url = if result.display_url.is_empty() {
            result.url.clone()
        } else {
            result.display_url.clone()
        };

        let page_id = self
            .store
            .insert_page(&NewPage {
                site_id: result.site_id,
                title: result.title.clone(),
                url: result.url.clone(),
                display_url: display_url.clone(),
                summary: summary.clone(),
                date: result.date.clone(),
                signature: signature(&result.url),
                content: result.content.clone(),
            })
            .await?;

        // A site's first crawl can yield hundreds of historical pages;
        // persist them but push none.
        if result.first_crawl {
            return Ok(NotifyOutcome::Persisted { page_id, pushes: 0 });
        }

        let mut pushes = 0;
        for sub in self.store.subscriptions(result.site_id).await? {
            if !self.quiet_hours.allows(&sub.user_id, now) {
                continue;
            }
            if !is_hit_keywords(&result.title, &result.content, &sub.filter_keywords) {
                continue;
            }

            let request = PushRequest {
                user_id: sub.user_id.clone(),
                title: result.title.clone(),
                summary: summary.clone(),
                url: display_url.clone(),
                source: result.site_name.clone(),
            };
            match self.pusher.push(&request).await {
                Ok(()) => {
                    pushes += 1;
                    info!(user = %sub.user_id, title = %result.title, "push sent");
                }
                Err(e) => {
                    error!(user = %sub.user_id, error = %e, "push delivery failed");
                }
            }
        }

        Ok(NotifyOutcome::Persisted { page_id, pushes })
    }

    /// Decode and handle one raw bus payload; used by the consumer loop.
    pub async fn handle_payload(&self, payload: Bytes) {
        let result: PageContentResult = match serde_json::from_slice(&payload) {
            Ok(result) => result,
            Err(error) => {
                error!(%error, "undecodable page content result");
                return;
            }
        };

        match self.handle(&result).await {
            Ok(NotifyOutcome::Persisted { page_id, pushes }) => {
                info!(page_id, pushes, url = %result.url, "page content persisted");
            }
            Ok(NotifyOutcome::Filtered) => {
                info!(url = %result.url, "page content filtered");
            }
            Err(error) => {
                error!(url = %result.url, %error, "page content handling failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::models::{CrawlType, PushSubscription, SiteConfig};
    use crate::store::MemoryPageStore;

    struct FixedSummarizer;

    #[async_trait]
    impl Summarizer for FixedSummarizer {
        async fn summarize(&self, title: &str, _content: &str) -> Result<String> {
            Ok(format!("summary of {title}"))
        }
    }

    #[derive(Default)]
    struct RecordingPusher {
        sent: Mutex<Vec<PushRequest>>,
    }

    impl RecordingPusher {
        fn sent(&self) -> Vec<PushRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PushSender for RecordingPusher {
        async fn push(&self, request: &PushRequest) -> Result<()> {
            self.sent.lock().unwrap().push(request.clone());
            Ok(())
        }
    }

    fn site(keywords: &str) -> SiteConfig {
        SiteConfig {
            id: 1,
            name: "Example".to_string(),
            list_url: "https://site.com/list".to_string(),
            list_crawl_type: CrawlType::HtmlStatic,
            detail_crawl_type: CrawlType::HtmlStatic,
            list_parse_rule: vec![],
            content_filter_keywords: keywords.to_string(),
            paywall: false,
            first_crawl: false,
        }
    }

    fn subscription(user_id: &str, keywords: &str) -> PushSubscription {
        PushSubscription {
            site_id: 1,
            user_id: user_id.to_string(),
            filter_keywords: keywords.to_string(),
        }
    }

    fn result(first_crawl: bool, paywall: bool) -> PageContentResult {
        PageContentResult {
            site_id: 1,
            site_name: "Example".to_string(),
            url: "https://site.com/news/1".to_string(),
            display_url: String::new(),
            title: "Acme launches widget".to_string(),
            date: "2025-08-20".to_string(),
            content: "Full body text".to_string(),
            paywall,
            first_crawl,
        }
    }

    fn engine(
        store: Arc<MemoryPageStore>,
        excluded: &[&str],
    ) -> (NotifyEngine, Arc<RecordingPusher>) {
        let pusher = Arc::new(RecordingPusher::default());
        let engine = NotifyEngine::new(
            store,
            Arc::new(FixedSummarizer),
            pusher.clone(),
            QuietHours::new(excluded.iter().map(|s| s.to_string())),
        );
        (engine, pusher)
    }

    fn weekday_noon() -> DateTime<Local> {
        // 2025-08-20 is a Wednesday.
        Local.with_ymd_and_hms(2025, 8, 20, 12, 0, 0).unwrap()
    }

    fn saturday_noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 8, 23, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_first_crawl_persists_but_never_pushes() {
        let store = Arc::new(MemoryPageStore::new());
        store.add_site(site(""));
        store.add_subscription(subscription("111", ""));
        let (engine, pusher) = engine(store.clone(), &[]);

        let outcome = engine
            .handle_at(&result(true, false), &weekday_noon())
            .await
            .unwrap();
        assert!(matches!(outcome, NotifyOutcome::Persisted { pushes: 0, .. }));
        assert_eq!(store.pages().len(), 1);
        assert!(pusher.sent().is_empty());
    }

    #[tokio::test]
    async fn test_site_keyword_miss_persists_nothing() {
        let store = Arc::new(MemoryPageStore::new());
        store.add_site(site("Unrelated"));
        let (engine, pusher) = engine(store.clone(), &[]);

        let outcome = engine
            .handle_at(&result(false, false), &weekday_noon())
            .await
            .unwrap();
        assert_eq!(outcome, NotifyOutcome::Filtered);
        assert!(store.pages().is_empty());
        assert!(pusher.sent().is_empty());
    }

    #[tokio::test]
    async fn test_subscriber_keyword_filter_applies() {
        let store = Arc::new(MemoryPageStore::new());
        store.add_site(site(""));
        store.add_subscription(subscription("hit", "Acme"));
        store.add_subscription(subscription("miss", "Globex"));
        let (engine, pusher) = engine(store, &[]);

        engine
            .handle_at(&result(false, false), &weekday_noon())
            .await
            .unwrap();
        let sent = pusher.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].user_id, "hit");
        assert_eq!(sent[0].summary, "summary of Acme launches widget");
    }

    #[tokio::test]
    async fn test_quiet_hours_blocks_excluded_user_on_saturday() {
        let store = Arc::new(MemoryPageStore::new());
        store.add_site(site(""));
        store.add_subscription(subscription("348170", ""));
        store.add_subscription(subscription("other", ""));
        let (engine, pusher) = engine(store, &["348170"]);

        engine
            .handle_at(&result(false, false), &saturday_noon())
            .await
            .unwrap();
        let sent = pusher.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].user_id, "other");
    }

    #[tokio::test]
    async fn test_paywall_uses_placeholder_summary() {
        let store = Arc::new(MemoryPageStore::new());
        store.add_site(site(""));
        let (engine, _) = engine(store.clone(), &[]);

        engine
            .handle_at(&result(false, true), &weekday_noon())
            .await
            .unwrap();
        assert_eq!(store.pages()[0].summary, PAYWALL_SUMMARY);
    }

    #[tokio::test]
    async fn test_display_url_defaults_to_url() {
        let store = Arc::new(MemoryPageStore::new());
        store.add_site(site(""));
        let (engine, _) = engine(store.clone(), &[]);

        engine
            .handle_at(&result(false, false), &weekday_noon())
            .await
            .unwrap();
        assert_eq!(store.pages()[0].display_url, "https://site.com/news/1");
    }

    #[tokio::test]
    async fn test_unknown_site_filtered() {
        let store = Arc::new(MemoryPageStore::new());
        let (engine, _) = engine(store.clone(), &[]);

        let outcome = engine
            .handle_at(&result(false, false), &weekday_noon())
            .await
            .unwrap();
        assert_eq!(outcome, NotifyOutcome::Filtered);
        assert!(store.pages().is_empty());
    }
}
