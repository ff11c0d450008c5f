// src/pipeline/detail.rs

//! Detail-stage consumer: detail page -> page content result.

use std::sync::Arc;

use chrono::Local;

use crate::bus::{BusPublisher, SUBJECT_PAGE_CONTENT, publish_json};
use crate::error::Result;
use crate::fetch::FetcherRegistry;
use crate::models::{DetailPageJob, PageContentResult};
use crate::services::ContentExtractor;

use super::{SkipReason, StageOutcome};

/// Handles one `DetailPageJob` end to end.
pub struct DetailStage {
    fetchers: Arc<FetcherRegistry>,
    extractor: Arc<dyn ContentExtractor>,
    bus: Arc<dyn BusPublisher>,
}

impl DetailStage {
    pub fn new(
        fetchers: Arc<FetcherRegistry>,
        extractor: Arc<dyn ContentExtractor>,
        bus: Arc<dyn BusPublisher>,
    ) -> Self {
        Self {
            fetchers,
            extractor,
            bus,
        }
    }

    /// Fetch the detail page, extract body and date, and publish the
    /// terminal result. A failed fetch or extraction drops the job; no
    /// retry is scheduled here.
    pub async fn handle(&self, job: &DetailPageJob) -> Result<StageOutcome> {
        let fetcher = self.fetchers.get(job.detail_crawl_type)?;
        let page = match fetcher.fetch(&job.url).await {
            Ok(page) => page,
            Err(e) => return Ok(StageOutcome::Skipped(SkipReason::Fetch(e.to_string()))),
        };

        let extracted = match self.extractor.extract(&page.body) {
            Ok(extracted) => extracted,
            Err(e) => return Ok(StageOutcome::Skipped(SkipReason::Extract(e.to_string()))),
        };

        let date = if extracted.date.is_empty() {
            Local::now().format("%Y-%m-%d").to_string()
        } else {
            extracted.date
        };

        let result = PageContentResult {
            site_id: job.site_id,
            site_name: job.site_name.clone(),
            url: job.url.clone(),
            display_url: job.display_url.clone(),
            title: job.title.clone(),
            date,
            content: extracted.content,
            paywall: job.paywall,
            first_crawl: job.first_crawl,
        };
        publish_json(self.bus.as_ref(), SUBJECT_PAGE_CONTENT, &result).await?;
        Ok(StageOutcome::Published(1))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::bus::testing::RecordingBus;
    use crate::fetch::{Fetcher, RawPage};
    use crate::models::CrawlType;
    use crate::services::SelectorContentExtractor;

    struct FixtureFetcher {
        body: &'static str,
    }

    #[async_trait]
    impl Fetcher for FixtureFetcher {
        async fn fetch(&self, _url: &str) -> Result<RawPage> {
            Ok(RawPage {
                body: self.body.to_string(),
            })
        }
    }

    fn stage(body: &'static str) -> (DetailStage, Arc<RecordingBus>) {
        let fetchers = Arc::new(
            FetcherRegistry::new()
                .register(CrawlType::HtmlStatic, Arc::new(FixtureFetcher { body })),
        );
        let bus = Arc::new(RecordingBus::new());
        (
            DetailStage::new(
                fetchers,
                Arc::new(SelectorContentExtractor::new().unwrap()),
                bus.clone(),
            ),
            bus,
        )
    }

    fn job() -> DetailPageJob {
        DetailPageJob {
            site_id: 1,
            site_name: "Example".to_string(),
            url: "https://site.com/news/1".to_string(),
            display_url: "https://site.com/news/1".to_string(),
            title: "Headline".to_string(),
            detail_crawl_type: CrawlType::HtmlStatic,
            first_crawl: false,
            paywall: false,
        }
    }

    #[tokio::test]
    async fn test_publishes_content_with_extracted_date() {
        let html = r#"
            <html><head><meta name="date" content="2025-05-20"></head>
            <body><article>Body text</article></body></html>"#;
        let (stage, bus) = stage(html);

        let outcome = stage.handle(&job()).await.unwrap();
        assert_eq!(outcome, StageOutcome::Published(1));

        let payloads = bus.payloads_for(SUBJECT_PAGE_CONTENT);
        let result: PageContentResult = serde_json::from_slice(&payloads[0]).unwrap();
        assert_eq!(result.date, "2025-05-20");
        assert_eq!(result.content, "Body text");
        assert_eq!(result.title, "Headline");
    }

    #[tokio::test]
    async fn test_missing_date_defaults_to_today() {
        let (stage, bus) = stage("<html><body><p>Text only</p></body></html>");

        stage.handle(&job()).await.unwrap();
        let payloads = bus.payloads_for(SUBJECT_PAGE_CONTENT);
        let result: PageContentResult = serde_json::from_slice(&payloads[0]).unwrap();
        assert_eq!(result.date, Local::now().format("%Y-%m-%d").to_string());
    }

    #[tokio::test]
    async fn test_empty_page_dropped() {
        let (stage, bus) = stage("<html><body></body></html>");

        let outcome = stage.handle(&job()).await.unwrap();
        assert!(matches!(outcome, StageOutcome::Skipped(SkipReason::Extract(_))));
        assert_eq!(bus.published_count(), 0);
    }
}
