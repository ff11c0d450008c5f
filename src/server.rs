// src/server.rs

//! Admin HTTP surface and the server-side content consumer.
//!
//! Exposes the crawl operations that run on demand rather than on the bus:
//! bulk dedup checks and the schedule fan-out. The same process consumes
//! `crawl.pagecontent` through the notification engine.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::watch;
use tracing::{error, info};

use crate::bus::{BusPublisher, MessageBus, SUBJECT_PAGE_CONTENT, consume};
use crate::config::Settings;
use crate::dedup::DedupEngine;
use crate::error::Result;
use crate::notify::{NotifyEngine, QuietHours};
use crate::pipeline::schedule_sites;
use crate::services::{HttpSummarizer, WebhookPushSender};
use crate::store::{PageStore, PgPageStore, PgSignatureStore, SignatureStore};

/// Shared state behind the admin routes.
pub struct AppState {
    pub store: Arc<dyn PageStore>,
    pub signatures: Arc<dyn SignatureStore>,
    pub bus: Arc<dyn BusPublisher>,
    pub admin_token: String,
}

/// Uniform response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            code: 0,
            message: "ok".to_string(),
            data: Some(data),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            code: 1,
            message: message.into(),
            data: None,
        }
    }
}

/// Build the admin router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/crawl/deduplicate", post(deduplicate))
        .route("/crawl/deduplicate/commit", post(deduplicate_commit))
        .route("/crawl/schedule", get(schedule))
        .with_state(state)
}

/// Check-only bulk dedup: reports which candidate URLs have never been
/// recorded, after blacklist filtering, without recording them.
async fn deduplicate(
    State(state): State<Arc<AppState>>,
    Json(urls): Json<Vec<String>>,
) -> Response {
    if urls.is_empty() {
        return Json(ApiResponse::success(Vec::<String>::new())).into_response();
    }

    let engine = DedupEngine::new(state.signatures.clone());
    let checked = async {
        let blacklist = state.store.domain_blacklist().await?;
        engine.check_only(&urls, &blacklist).await
    }
    .await;

    match checked {
        Ok(unseen) => Json(ApiResponse::success(unseen)).into_response(),
        Err(error) => internal_error("deduplicate failed", error),
    }
}

/// Committing dedup used by crawl workers deployed without database access:
/// same contract as the local engine's `filter_new`.
async fn deduplicate_commit(
    State(state): State<Arc<AppState>>,
    Json(urls): Json<Vec<String>>,
) -> Response {
    if urls.is_empty() {
        return Json(ApiResponse::success(Vec::<String>::new())).into_response();
    }

    let engine = DedupEngine::new(state.signatures.clone());
    let filtered = async {
        let blacklist = state.store.domain_blacklist().await?;
        engine.filter_new(urls, &blacklist).await
    }
    .await;

    match filtered {
        Ok(fresh) => Json(ApiResponse::success(fresh)).into_response(),
        Err(error) => internal_error("deduplicate commit failed", error),
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: String,
}

/// Fan out one `ListPageJob` per site (admin/cron trigger).
async fn schedule(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
) -> Response {
    if query.token != state.admin_token {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<bool>::fail("unauthorized")),
        )
            .into_response();
    }

    match schedule_sites(state.store.as_ref(), state.bus.as_ref()).await {
        Ok(count) => {
            info!(count, "schedule fan-out complete");
            Json(ApiResponse::success(true)).into_response()
        }
        Err(error) => internal_error("schedule failed", error),
    }
}

fn internal_error(context: &str, error: crate::error::AppError) -> Response {
    error!(%error, "{context}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<bool>::fail(context)),
    )
        .into_response()
}

/// Run the server role: migrations, the page-content consumer, and the
/// admin HTTP surface, until ctrl-c.
pub async fn run_server(settings: &Settings) -> Result<()> {
    let pool = PgPool::connect(&settings.database_url).await?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| crate::error::AppError::config(format!("migrations failed: {e}")))?;

    let store: Arc<dyn PageStore> = Arc::new(PgPageStore::new(pool.clone()));
    let signatures: Arc<dyn SignatureStore> = Arc::new(PgSignatureStore::new(pool));

    let bus = MessageBus::connect(settings).await?;
    let publisher: Arc<dyn BusPublisher> = Arc::new(bus.clone());

    let http_client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(settings.http_timeout_secs))
        .build()?;
    let engine = Arc::new(NotifyEngine::new(
        store.clone(),
        Arc::new(HttpSummarizer::new(
            http_client.clone(),
            settings.summary_url.clone(),
            settings.summary_api_key.clone(),
        )),
        Arc::new(WebhookPushSender::new(http_client, settings.push_url.clone())),
        QuietHours::new(settings.quiet_hours_users.iter().cloned()),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    let content_sub = bus.queue_subscribe(SUBJECT_PAGE_CONTENT).await?;
    let consumer = {
        let engine = engine.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            consume(content_sub, shutdown, |payload| {
                let engine = engine.clone();
                async move { engine.handle_payload(payload).await }
            })
            .await;
        })
    };

    let state = Arc::new(AppState {
        store,
        signatures,
        bus: publisher,
        admin_token: settings.admin_token.clone(),
    });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    info!(addr = %settings.bind_addr, "admin server listening");

    let mut http_shutdown = shutdown_rx;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = http_shutdown.changed().await;
        })
        .await?;

    let _ = consumer.await;
    bus.flush().await?;
    info!("server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shapes() {
        let ok = serde_json::to_value(ApiResponse::success(vec!["a".to_string()])).unwrap();
        assert_eq!(ok["code"], 0);
        assert_eq!(ok["data"][0], "a");

        let fail = serde_json::to_value(ApiResponse::<bool>::fail("nope")).unwrap();
        assert_eq!(fail["code"], 1);
        assert!(fail["data"].is_null());
    }
}
