// src/extract/mod.rs

//! Extraction rule engine.
//!
//! Turns per-site rule strings into structured link data without per-site
//! code. Two dialects exist, selected by the crawl type:
//!
//! - selector rules for static/dynamic HTML list pages (`selector` module)
//! - structured-data rules for JSON list pages (`json` module)
//!
//! Both produce a [`LinkSet`](crate::models::LinkSet) keyed by final URL.

mod json;
mod selector;

pub use json::{JsonPath, StructuredRule};
pub use selector::{SelectorRule, extract_links};

use crate::error::Result;
use crate::models::{CrawlType, LinkSet};

/// Compiled form of a job's rule list, built once per job and reused.
#[derive(Debug)]
pub enum ParseRule {
    /// Independent selector extraction units whose results are unioned
    Selector(Vec<SelectorRule>),
    /// Single structured-data rule
    Structured(StructuredRule),
}

impl ParseRule {
    /// Compile raw rule strings for the given crawl type.
    pub fn compile(crawl_type: CrawlType, rule: &[String]) -> Result<Self> {
        match crawl_type {
            CrawlType::HtmlStatic | CrawlType::HtmlDynamic => {
                let rules = rule
                    .iter()
                    .map(|r| SelectorRule::parse(r))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::Selector(rules))
            }
            CrawlType::Json => Ok(Self::Structured(StructuredRule::from_rule(rule)?)),
        }
    }

    /// Run the compiled rule over a fetched page body.
    ///
    /// `body` is raw HTML for the selector dialect and a JSON document for
    /// the structured dialect. An empty result is an empty link set, not an
    /// error.
    pub fn extract(&self, base_url: &str, body: &str) -> Result<LinkSet> {
        match self {
            Self::Selector(rules) => extract_links(base_url, body, rules),
            Self::Structured(rule) => {
                let root: serde_json::Value = serde_json::from_str(body)?;
                rule.extract(&root)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_selects_dialect_by_crawl_type() {
        let rule = vec!["div.list a".to_string()];
        assert!(matches!(
            ParseRule::compile(CrawlType::HtmlStatic, &rule),
            Ok(ParseRule::Selector(_))
        ));
        assert!(matches!(
            ParseRule::compile(CrawlType::HtmlDynamic, &rule),
            Ok(ParseRule::Selector(_))
        ));

        let json_rule = vec![
            "$.items".to_string(),
            "$.title".to_string(),
            "$.id".to_string(),
            "".to_string(),
        ];
        assert!(matches!(
            ParseRule::compile(CrawlType::Json, &json_rule),
            Ok(ParseRule::Structured(_))
        ));
    }

    #[test]
    fn test_compile_short_json_rule_is_config_error() {
        let rule = vec!["$.items".to_string()];
        assert!(ParseRule::compile(CrawlType::Json, &rule).is_err());
    }
}
