// src/pipeline/worker.rs

//! Crawl worker runtime.
//!
//! Runs the list-stage and detail-stage consumer loops as two concurrent
//! tasks over one bus connection. Each message is handled to completion
//! before its loop accepts the next one; scale-out happens across the
//! worker fleet through queue-group load balancing. Per-message failures
//! are logged and isolated so one bad site never stops the loop.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use sqlx::PgPool;
use tokio::sync::watch;
use tracing::{error, info};

use crate::bus::{MessageBus, SUBJECT_DETAIL_PAGE, SUBJECT_LIST_PAGE, BusPublisher, consume};
use crate::config::Settings;
use crate::dedup::{Deduplicator, HttpDedup, LocalDedup};
use crate::error::Result;
use crate::fetch::FetcherRegistry;
use crate::models::{DetailPageJob, ListPageJob};
use crate::services::SelectorContentExtractor;
use crate::store::{PgPageStore, PgSignatureStore};

use super::{DetailStage, ListStage, StageOutcome};

/// Run both stage loops until ctrl-c; in-flight messages complete before
/// the bus connection is released.
pub async fn run_worker(settings: &Settings) -> Result<()> {
    let bus = MessageBus::connect(settings).await?;
    let fetchers = Arc::new(FetcherRegistry::from_settings(settings)?);

    let dedup: Arc<dyn Deduplicator> = match &settings.dedup_url {
        Some(endpoint) => {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(settings.http_timeout_secs))
                .build()?;
            Arc::new(HttpDedup::new(client, endpoint.clone()))
        }
        None => {
            let pool = PgPool::connect(&settings.database_url).await?;
            Arc::new(LocalDedup::new(
                Arc::new(PgSignatureStore::new(pool.clone())),
                Arc::new(PgPageStore::new(pool)),
            ))
        }
    };

    let publisher: Arc<dyn BusPublisher> = Arc::new(bus.clone());
    let list_stage = Arc::new(ListStage::new(fetchers.clone(), dedup, publisher.clone()));
    let detail_stage = Arc::new(DetailStage::new(
        fetchers,
        Arc::new(SelectorContentExtractor::new()?),
        publisher,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    let list_sub = bus.queue_subscribe(SUBJECT_LIST_PAGE).await?;
    let detail_sub = bus.queue_subscribe(SUBJECT_DETAIL_PAGE).await?;
    info!("crawl worker consuming list and detail subjects");

    let list_loop = consume(list_sub, shutdown_rx.clone(), |payload| {
        let stage = list_stage.clone();
        async move { handle_list_message(&stage, payload).await }
    });
    let detail_loop = consume(detail_sub, shutdown_rx, |payload| {
        let stage = detail_stage.clone();
        async move { handle_detail_message(&stage, payload).await }
    });
    tokio::join!(list_loop, detail_loop);

    bus.flush().await?;
    info!("crawl worker stopped");
    Ok(())
}

async fn handle_list_message(stage: &ListStage, payload: Bytes) {
    let job: ListPageJob = match serde_json::from_slice(&payload) {
        Ok(job) => job,
        Err(error) => {
            error!(%error, "undecodable list page job");
            return;
        }
    };

    match stage.handle(&job).await {
        Ok(StageOutcome::Published(count)) => {
            info!(site = %job.site_name, url = %job.url, published = count, "list page processed");
        }
        Ok(StageOutcome::Skipped(reason)) => {
            info!(site = %job.site_name, url = %job.url, ?reason, "list page skipped");
        }
        Err(error) => {
            error!(site = %job.site_name, url = %job.url, %error, "list page failed");
        }
    }
}

async fn handle_detail_message(stage: &DetailStage, payload: Bytes) {
    let job: DetailPageJob = match serde_json::from_slice(&payload) {
        Ok(job) => job,
        Err(error) => {
            error!(%error, "undecodable detail page job");
            return;
        }
    };

    match stage.handle(&job).await {
        Ok(StageOutcome::Published(_)) => {
            info!(site = %job.site_name, url = %job.url, "detail page processed");
        }
        Ok(StageOutcome::Skipped(reason)) => {
            info!(site = %job.site_name, url = %job.url, ?reason, "detail page skipped");
        }
        Err(error) => {
            error!(site = %job.site_name, url = %job.url, %error, "detail page failed");
        }
    }
}
