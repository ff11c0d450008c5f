// src/models/site.rs

//! Site configuration as supplied by the scheduler.

use serde::{Deserialize, Serialize};

/// How a page is fetched and which rule dialect applies to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlType {
    /// Plain HTTP GET, selector rules
    HtmlStatic,
    /// Headless-browser rendering, selector rules
    HtmlDynamic,
    /// HTTP GET of a JSON document, structured-data rules
    Json,
}

impl CrawlType {
    /// Wire/database name for this crawl type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HtmlStatic => "html_static",
            Self::HtmlDynamic => "html_dynamic",
            Self::Json => "json",
        }
    }

    /// Parse a wire/database name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "html_static" => Some(Self::HtmlStatic),
            "html_dynamic" => Some(Self::HtmlDynamic),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Per-site crawl configuration.
///
/// Immutable for the duration of a crawl cycle; the pipeline reads it when
/// synthesizing `ListPageJob`s and never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub id: i64,
    pub name: String,
    pub list_url: String,
    pub list_crawl_type: CrawlType,
    pub detail_crawl_type: CrawlType,
    /// Ordered rule strings; dialect depends on `list_crawl_type`
    pub list_parse_rule: Vec<String>,
    /// Comma-separated keyword filter, empty means always visible
    pub content_filter_keywords: String,
    pub paywall: bool,
    /// True until the site's first crawl cycle has completed
    pub first_crawl: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&CrawlType::HtmlStatic).unwrap(),
            "\"html_static\""
        );
        assert_eq!(
            serde_json::from_str::<CrawlType>("\"json\"").unwrap(),
            CrawlType::Json
        );
    }
}
