// src/models/mod.rs

//! Domain models for the crawl pipeline.
//!
//! This module contains the data structures shared across components,
//! organized by their primary purpose: site configuration, bus messages,
//! and persisted entities.

mod linkset;
mod messages;
mod page;
mod site;

// Re-export all public types
pub use linkset::LinkSet;
pub use messages::{DetailPageJob, ListPageJob, PageContentResult};
pub use page::{NewPage, PushSubscription};
pub use site::{CrawlType, SiteConfig};
