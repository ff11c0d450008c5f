// src/lib.rs

//! newswatch: multi-stage crawl pipeline with filtered push notifications.

pub mod bus;
pub mod config;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod server;
pub mod services;
pub mod store;
