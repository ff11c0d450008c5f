// src/pipeline/list.rs

//! List-stage consumer: list page -> deduped detail jobs.

use std::sync::Arc;

use url::Url;

use crate::bus::{BusPublisher, SUBJECT_DETAIL_PAGE, publish_json};
use crate::dedup::Deduplicator;
use crate::error::Result;
use crate::extract::ParseRule;
use crate::fetch::FetcherRegistry;
use crate::models::{CrawlType, DetailPageJob, ListPageJob};

use super::{SkipReason, StageOutcome};

/// Handles one `ListPageJob` end to end.
pub struct ListStage {
    fetchers: Arc<FetcherRegistry>,
    dedup: Arc<dyn Deduplicator>,
    bus: Arc<dyn BusPublisher>,
}

impl ListStage {
    pub fn new(
        fetchers: Arc<FetcherRegistry>,
        dedup: Arc<dyn Deduplicator>,
        bus: Arc<dyn BusPublisher>,
    ) -> Self {
        Self {
            fetchers,
            dedup,
            bus,
        }
    }

    /// Fetch the list page, extract links, drop already-seen URLs, and
    /// publish one detail job per survivor.
    pub async fn handle(&self, job: &ListPageJob) -> Result<StageOutcome> {
        let rule = match ParseRule::compile(job.list_crawl_type, &job.rule) {
            Ok(rule) => rule,
            Err(e) => return Ok(StageOutcome::Skipped(SkipReason::BadRule(e.to_string()))),
        };

        let fetcher = self.fetchers.get(job.list_crawl_type)?;
        let page = match fetcher.fetch(&job.url).await {
            Ok(page) => page,
            Err(e) => return Ok(StageOutcome::Skipped(SkipReason::Fetch(e.to_string()))),
        };

        let links = match rule.extract(&job.url, &page.body) {
            Ok(links) => links,
            Err(e) => return Ok(StageOutcome::Skipped(SkipReason::Extract(e.to_string()))),
        };
        if links.is_empty() {
            return Ok(StageOutcome::Skipped(SkipReason::EmptyLinkSet));
        }

        let candidates: Vec<String> = links.urls().map(String::from).collect();
        let fresh = self.dedup.filter_new(candidates).await?;
        if fresh.is_empty() {
            return Ok(StageOutcome::Skipped(SkipReason::AllSeen));
        }

        for url in &fresh {
            let detail_job = DetailPageJob {
                site_id: job.site_id,
                site_name: job.site_name.clone(),
                url: url.clone(),
                display_url: links.display_url(url).to_string(),
                title: links.title(url).unwrap_or_default().to_string(),
                detail_crawl_type: effective_detail_type(job, url),
                first_crawl: job.first_crawl,
                paywall: job.paywall,
            };
            publish_json(self.bus.as_ref(), SUBJECT_DETAIL_PAGE, &detail_job).await?;
        }
        Ok(StageOutcome::Published(fresh.len()))
    }
}

/// Off-domain links found on an HTML list page are frequently behind
/// anti-bot static responses, so they fall back to full rendering; JSON
/// list pages and same-domain links keep the configured type.
fn effective_detail_type(job: &ListPageJob, url: &str) -> CrawlType {
    if job.list_crawl_type != CrawlType::Json && !same_domain(&job.url, url) {
        return CrawlType::HtmlDynamic;
    }
    job.detail_crawl_type
}

fn same_domain(a: &str, b: &str) -> bool {
    match (get_domain(a), get_domain(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn get_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
}
