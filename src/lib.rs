//! CFBD Proxy - A caching proxy for the CollegeFootballData API
//!
//! Wraps the upstream API with rate limiting, TTL caching, retries, and
//! typed response validation, and serves the results over a small REST
//! surface alongside a reactive query layer for embedders.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod tasks;

pub use api::AppState;
pub use client::CfbdClient;
pub use config::Config;
pub use tasks::spawn_sweeper_task;
