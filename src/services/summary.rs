// src/services/summary.rs

//! Summarization collaborator.

use async_trait::async_trait;
use serde_json::json;

use crate::error::Result;

/// Summary shown for paywalled pages instead of calling the summarizer.
pub const PAYWALL_SUMMARY: &str =
    "This site carries paid subscription content, see the original page";

/// Collaborator producing a short summary for a page.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, title: &str, content: &str) -> Result<String>;
}

/// HTTP-backed summarizer calling an LLM gateway.
pub struct HttpSummarizer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpSummarizer {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(serde::Deserialize)]
struct SummaryResponse {
    text: String,
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, title: &str, content: &str) -> Result<String> {
        let response: SummaryResponse = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({ "title": title, "content": content }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.text)
    }
}
