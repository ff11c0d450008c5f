// src/fetch/browser.rs

//! Headless-browser fetcher for dynamic pages.
//!
//! Delegates rendering to a browserless-style service: POST the target URL
//! to `/content`, receive the fully rendered HTML.

use async_trait::async_trait;
use serde_json::json;

use crate::error::{AppError, Result};

use super::{FetchLimiter, Fetcher, RawPage};

/// Fetches a page through a rendering service's `/content` endpoint.
pub struct RenderFetcher {
    client: reqwest::Client,
    endpoint: String,
    limiter: FetchLimiter,
}

impl RenderFetcher {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        token: Option<&str>,
        limiter: FetchLimiter,
    ) -> Self {
        let mut endpoint = format!("{}/content", base_url.trim_end_matches('/'));
        if let Some(token) = token {
            endpoint.push_str(&format!("?token={token}"));
        }
        Self {
            client,
            endpoint,
            limiter,
        }
    }
}

#[async_trait]
impl Fetcher for RenderFetcher {
    async fn fetch(&self, url: &str) -> Result<RawPage> {
        let _permit = self.limiter.acquire().await?;
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "url": url }))
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::fetch(url, format!("renderer {status}: {message}")));
        }

        let body = response.text().await.map_err(|e| AppError::fetch(url, e))?;
        Ok(RawPage { body })
    }
}
