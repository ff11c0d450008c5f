// src/store/pg.rs

//! Postgres-backed stores.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::error::{AppError, Result};
use crate::models::{CrawlType, NewPage, PushSubscription, SiteConfig};

use super::{PageStore, SignatureStore};

/// Signature ledger on top of a unique column; insert races resolve to
/// "already seen" via `ON CONFLICT DO NOTHING`.
pub struct PgSignatureStore {
    pool: PgPool,
}

impl PgSignatureStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SignatureStore for PgSignatureStore {
    async fn existing(&self, signatures: &[String]) -> Result<HashSet<String>> {
        if signatures.is_empty() {
            return Ok(HashSet::new());
        }

        let rows = sqlx::query("SELECT signature FROM page_signatures WHERE signature = ANY($1)")
            .bind(signatures)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|r| r.get("signature")).collect())
    }

    async fn insert(&self, signature: &str) -> Result<bool> {
        let result =
            sqlx::query("INSERT INTO page_signatures (signature) VALUES ($1) ON CONFLICT (signature) DO NOTHING")
                .bind(signature)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }
}

/// Page/site/subscription access.
pub struct PgPageStore {
    pool: PgPool,
}

impl PgPageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PageStore for PgPageStore {
    async fn site_filter_keywords(&self, site_id: i64) -> Result<Option<String>> {
        let row = sqlx::query("SELECT content_filter_keywords FROM sites WHERE id = $1")
            .bind(site_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("content_filter_keywords")))
    }

    async fn insert_page(&self, page: &NewPage) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO pages (site_id, title, url, display_url, summary, date, signature, visible)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
            RETURNING id
            "#,
        )
        .bind(page.site_id)
        .bind(&page.title)
        .bind(&page.url)
        .bind(&page.display_url)
        .bind(&page.summary)
        .bind(&page.date)
        .bind(&page.signature)
        .fetch_one(&mut *tx)
        .await?;
        let page_id: i64 = row.get("id");

        sqlx::query("INSERT INTO page_contents (page_id, content) VALUES ($1, $2)")
            .bind(page_id)
            .bind(&page.content)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(page_id)
    }

    async fn subscriptions(&self, site_id: i64) -> Result<Vec<PushSubscription>> {
        let rows = sqlx::query(
            "SELECT site_id, user_id, filter_keywords FROM push_subscriptions WHERE site_id = $1",
        )
        .bind(site_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| PushSubscription {
                site_id: r.get("site_id"),
                user_id: r.get("user_id"),
                filter_keywords: r.get("filter_keywords"),
            })
            .collect())
    }

    async fn list_sites(&self) -> Result<Vec<SiteConfig>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, list_url, list_crawl_type, detail_crawl_type,
                   list_parse_rule, content_filter_keywords, paywall,
                   crawled_at IS NULL AS first_crawl
            FROM sites
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                let list_type: String = r.get("list_crawl_type");
                let detail_type: String = r.get("detail_crawl_type");
                let rule: serde_json::Value = r.get("list_parse_rule");
                Ok(SiteConfig {
                    id: r.get("id"),
                    name: r.get("name"),
                    list_url: r.get("list_url"),
                    list_crawl_type: parse_crawl_type(&list_type)?,
                    detail_crawl_type: parse_crawl_type(&detail_type)?,
                    list_parse_rule: serde_json::from_value(rule)?,
                    content_filter_keywords: r.get("content_filter_keywords"),
                    paywall: r.get("paywall"),
                    first_crawl: r.get("first_crawl"),
                })
            })
            .collect()
    }

    async fn mark_crawled(&self, site_id: i64) -> Result<()> {
        sqlx::query("UPDATE sites SET crawled_at = NOW() WHERE id = $1")
            .bind(site_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn domain_blacklist(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT domain FROM domain_blacklist")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|r| r.get("domain")).collect())
    }
}

fn parse_crawl_type(s: &str) -> Result<CrawlType> {
    CrawlType::parse(s).ok_or_else(|| AppError::config(format!("unknown crawl type '{s}'")))
}
