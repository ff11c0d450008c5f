// src/bus.rs

//! Message bus adapter.
//!
//! Thin contract over core NATS: three crawl subjects, queue-group
//! (competing-consumer) delivery, JSON payloads. Stage handlers publish
//! through the [`BusPublisher`] trait so tests can swap in a recording
//! double without a broker.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use serde::Serialize;
use tracing::debug;

use crate::config::Settings;
use crate::error::{AppError, Result};

/// Subject carrying one `ListPageJob` per site and cycle.
pub const SUBJECT_LIST_PAGE: &str = "crawl.listpage";
/// Subject carrying one `DetailPageJob` per surviving link.
pub const SUBJECT_DETAIL_PAGE: &str = "crawl.detailpage";
/// Subject carrying terminal `PageContentResult`s.
pub const SUBJECT_PAGE_CONTENT: &str = "crawl.pagecontent";

/// Queue group shared by all workers; NATS delivers each message to exactly
/// one member.
pub const QUEUE_GROUP: &str = "workers";

/// Trait for publish operations, allowing tests to capture traffic.
#[async_trait]
pub trait BusPublisher: Send + Sync {
    /// Publish a raw payload to a subject.
    async fn publish(&self, subject: &'static str, payload: Bytes) -> Result<()>;
}

/// Serialize a message and publish it through any [`BusPublisher`].
pub async fn publish_json<T: Serialize + Sync>(
    bus: &dyn BusPublisher,
    subject: &'static str,
    msg: &T,
) -> Result<()> {
    let payload = serde_json::to_vec(msg)?;
    bus.publish(subject, Bytes::from(payload)).await
}

/// NATS-backed message bus.
#[derive(Clone)]
pub struct MessageBus {
    client: async_nats::Client,
}

impl MessageBus {
    /// Connect to the broker configured in `settings`.
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let mut options = async_nats::ConnectOptions::new();
        if !settings.nats_token.is_empty() {
            options = options.token(settings.nats_token.clone());
        }
        let client = options
            .connect(settings.nats_url.as_str())
            .await
            .map_err(AppError::bus)?;
        debug!(url = %settings.nats_url, "connected to message bus");
        Ok(Self { client })
    }

    /// Subscribe to a subject as a member of the shared worker queue group.
    pub async fn queue_subscribe(&self, subject: &'static str) -> Result<async_nats::Subscriber> {
        self.client
            .queue_subscribe(subject, QUEUE_GROUP.to_string())
            .await
            .map_err(AppError::bus)
    }

    /// Flush buffered publishes; called before a worker releases its
    /// connection on shutdown.
    pub async fn flush(&self) -> Result<()> {
        self.client.flush().await.map_err(AppError::bus)
    }
}

#[async_trait]
impl BusPublisher for MessageBus {
    async fn publish(&self, subject: &'static str, payload: Bytes) -> Result<()> {
        self.client
            .publish(subject, payload)
            .await
            .map_err(AppError::bus)
    }
}

/// Drain a subscriber into per-message handler calls until the shutdown
/// signal fires. The in-flight message always runs to completion; only the
/// wait for the next message is interruptible.
pub async fn consume<F, Fut>(
    mut sub: async_nats::Subscriber,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
    mut handle: F,
) where
    F: FnMut(Bytes) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    loop {
        let msg = tokio::select! {
            _ = shutdown.changed() => break,
            msg = sub.next() => match msg {
                Some(msg) => msg,
                None => break,
            },
        };
        handle(msg.payload).await;
    }
    let _ = sub.unsubscribe().await;
}

/// Recording bus double for tests.
#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Captures published messages instead of sending them anywhere.
    #[derive(Default)]
    pub struct RecordingBus {
        published: Mutex<Vec<(&'static str, Bytes)>>,
    }

    impl RecordingBus {
        pub fn new() -> Self {
            Self::default()
        }

        /// All payloads published to `subject`.
        pub fn payloads_for(&self, subject: &str) -> Vec<Bytes> {
            self.published
                .lock()
                .unwrap()
                .iter()
                .filter(|(s, _)| *s == subject)
                .map(|(_, p)| p.clone())
                .collect()
        }

        pub fn published_count(&self) -> usize {
            self.published.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl BusPublisher for RecordingBus {
        async fn publish(&self, subject: &'static str, payload: Bytes) -> Result<()> {
            self.published.lock().unwrap().push((subject, payload));
            Ok(())
        }
    }
}
