// src/services/push.rs

//! Push delivery collaborator.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// One outbound push message.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PushRequest {
    pub user_id: String,
    pub title: String,
    pub summary: String,
    pub url: String,
    /// Site name shown as the message source
    pub source: String,
}

/// Collaborator delivering push messages to subscribers.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn push(&self, request: &PushRequest) -> Result<()>;
}

/// Webhook-backed delivery: one JSON POST per message.
pub struct WebhookPushSender {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookPushSender {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl PushSender for WebhookPushSender {
    async fn push(&self, request: &PushRequest) -> Result<()> {
        self.client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
