//! Feed subscription service.
//!
//! Resolves arbitrary web URLs to their RSS/Atom feed, records per-user
//! subscriptions in SQLite, and serves them over a small HTTP API.

pub mod api;
pub mod config;
pub mod feed;
pub mod storage;
pub mod subscribe;
pub mod util;
