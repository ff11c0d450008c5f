// src/models/messages.rs

//! Bus message payloads.
//!
//! Field names are a stable wire contract; payloads travel as UTF-8 JSON on
//! the three crawl subjects. Each message is consumed exactly once within
//! its queue group and carries no identity beyond its payload.

use serde::{Deserialize, Serialize};

use super::CrawlType;

/// One list-page crawl request, produced by the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPageJob {
    pub site_id: i64,
    pub site_name: String,
    pub url: String,
    pub list_crawl_type: CrawlType,
    pub detail_crawl_type: CrawlType,
    pub rule: Vec<String>,
    pub paywall: bool,
    pub first_crawl: bool,
}

/// One detail-page crawl request, produced by the list stage per surviving
/// link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailPageJob {
    pub site_id: i64,
    pub site_name: String,
    pub url: String,
    /// URL shown to subscribers; defaults to `url` when the rule supplies none
    pub display_url: String,
    pub title: String,
    pub detail_crawl_type: CrawlType,
    pub first_crawl: bool,
    pub paywall: bool,
}

/// Terminal message of the crawl pipeline, produced by the detail stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContentResult {
    pub site_id: i64,
    pub site_name: String,
    pub url: String,
    pub display_url: String,
    pub title: String,
    /// Publish date if extracted, processing date otherwise (`%Y-%m-%d`)
    pub date: String,
    pub content: String,
    pub paywall: bool,
    pub first_crawl: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_job_round_trip_keeps_field_names() {
        let job = ListPageJob {
            site_id: 7,
            site_name: "Example".to_string(),
            url: "https://example.com/news".to_string(),
            list_crawl_type: CrawlType::HtmlStatic,
            detail_crawl_type: CrawlType::HtmlDynamic,
            rule: vec!["div.item a".to_string()],
            paywall: false,
            first_crawl: true,
        };

        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["list_crawl_type"], "html_static");
        assert_eq!(value["rule"][0], "div.item a");

        let back: ListPageJob = serde_json::from_value(value).unwrap();
        assert_eq!(back.site_id, 7);
        assert!(back.first_crawl);
    }
}
