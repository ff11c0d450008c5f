// src/services/extractor.rs

//! Detail-page body extraction collaborator.

use scraper::{Html, Selector};

use crate::error::{AppError, Result};

/// Body and publish date extracted from a detail page.
#[derive(Debug, Clone, Default)]
pub struct ExtractedContent {
    pub content: String,
    /// Publish date when the page exposes one, empty otherwise
    pub date: String,
}

/// Collaborator that strips boilerplate from a rendered detail page.
pub trait ContentExtractor: Send + Sync {
    fn extract(&self, html: &str) -> Result<ExtractedContent>;
}

/// Selector-based extractor: takes the first `<article>`/`<main>` (falling
/// back to `<body>`) as the content region and common meta tags as the
/// publish date.
pub struct SelectorContentExtractor {
    regions: Vec<Selector>,
    date_metas: Vec<Selector>,
}

impl SelectorContentExtractor {
    pub fn new() -> Result<Self> {
        let parse = |s: &str| Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")));
        Ok(Self {
            regions: vec![parse("article")?, parse("main")?, parse("body")?],
            date_metas: vec![
                parse(r#"meta[property="article:published_time"]"#)?,
                parse(r#"meta[name="publishdate"]"#)?,
                parse(r#"meta[name="date"]"#)?,
                parse("time[datetime]")?,
            ],
        })
    }
}

impl ContentExtractor for SelectorContentExtractor {
    fn extract(&self, html: &str) -> Result<ExtractedContent> {
        let document = Html::parse_document(html);

        let mut content = String::new();
        for region in &self.regions {
            if let Some(element) = document.select(region).next() {
                content = element
                    .text()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n");
                if !content.is_empty() {
                    break;
                }
            }
        }
        if content.is_empty() {
            return Err(AppError::extract("no text content in document"));
        }

        let mut date = String::new();
        for meta in &self.date_metas {
            if let Some(element) = document.select(meta).next() {
                let value = element
                    .value()
                    .attr("content")
                    .or_else(|| element.value().attr("datetime"))
                    .unwrap_or("");
                // Keep only the date part of a timestamp.
                let value = value.split('T').next().unwrap_or(value).trim();
                if !value.is_empty() {
                    date = value.to_string();
                    break;
                }
            }
        }

        Ok(ExtractedContent { content, date })
    }
}
