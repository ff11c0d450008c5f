// src/pipeline/mod.rs

//! Crawl pipeline state machine.
//!
//! Two symmetric stage consumers pull jobs from the bus and drive each
//! message through a strictly linear journey:
//! received -> fetched -> extracted -> (deduped, list stage only) ->
//! published or dropped. No state is held across stages; the only
//! persistent state is the dedup ledger and the destination queues.

mod detail;
mod list;
mod schedule;
mod worker;

pub use detail::DetailStage;
pub use list::ListStage;
pub use schedule::schedule_sites;
pub use worker::run_worker;

/// Result of handling one stage message.
///
/// A skipped message is a normal end state, not an error; hard errors
/// (bus down, database down) surface as `Err` from the handler so the
/// consumer loop can log them without treating the message as handled.
#[derive(Debug, PartialEq, Eq)]
pub enum StageOutcome {
    /// Published this many next-stage messages
    Published(usize),
    /// Message ended quietly at this stage
    Skipped(SkipReason),
}

/// Why a message ended without publishing.
#[derive(Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Malformed rule list for the job's crawl type
    BadRule(String),
    /// Fetch collaborator reported failure or timed out
    Fetch(String),
    /// Page didn't yield anything under the rule
    Extract(String),
    /// Rule ran fine but matched no links
    EmptyLinkSet,
    /// Every extracted link was already in the ledger
    AllSeen,
}
