// src/models/page.rs

//! Persisted entities the pipeline writes or reads.

use serde::{Deserialize, Serialize};

/// A page row to persist after the notification filter accepts a result.
#[derive(Debug, Clone)]
pub struct NewPage {
    pub site_id: i64,
    pub title: String,
    pub url: String,
    pub display_url: String,
    pub summary: String,
    pub date: String,
    /// Hex signature of `url`, same value the dedup ledger holds
    pub signature: String,
    pub content: String,
}

/// An active push subscription for a site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscription {
    pub site_id: i64,
    /// Subscriber identity used by the delivery collaborator
    pub user_id: String,
    /// Comma-separated keyword filter, empty means every page matches
    pub filter_keywords: String,
}
