// src/fetch/http.rs

//! Plain HTTP fetcher for static HTML and JSON list pages.

use async_trait::async_trait;

use crate::error::{AppError, Result};

use super::{FetchLimiter, Fetcher, RawPage};

/// Fetches a page with a single GET; the client carries the browser user
/// agent and the per-request timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
    limiter: FetchLimiter,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client, limiter: FetchLimiter) -> Self {
        Self { client, limiter }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<RawPage> {
        let _permit = self.limiter.acquire().await?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(url, format!("status {status}")));
        }

        let body = response.text().await.map_err(|e| AppError::fetch(url, e))?;
        Ok(RawPage { body })
    }
}
