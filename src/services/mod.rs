// src/services/mod.rs

//! External collaborator seams.
//!
//! The pipeline calls outward through these traits:
//! - body/date extraction from detail pages (`ContentExtractor`)
//! - LLM summarization (`Summarizer`)
//! - chat push delivery (`PushSender`)
//!
//! Production wiring uses the HTTP-backed implementations; tests substitute
//! the recording doubles defined alongside the consumers.

mod extractor;
mod push;
mod summary;

pub use extractor::{ContentExtractor, ExtractedContent, SelectorContentExtractor};
pub use push::{PushRequest, PushSender, WebhookPushSender};
pub use summary::{HttpSummarizer, PAYWALL_SUMMARY, Summarizer};
