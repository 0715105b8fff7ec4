//! # clawdeck-core
//!
//! Core library for clawdeck - an AI agent activity dashboard.
//!
//! This library provides:
//! - Domain types for activities, sessions, and analytics
//! - Transcript reading, tool-call classification, and session reconstruction
//! - Explicit activity stores (JSON file or SQLite)
//! - The merged activity feed with dedup
//! - Cost and rhythm analytics
//! - A gateway client for waking the agent and inspecting its cron jobs
//!
//! ## Architecture
//!
//! Data flows from two independent sources into one timeline:
//! - **Transcripts:** append-only `.jsonl` session files written by the agent,
//!   read fresh on every query (the agent owns them, we never write)
//! - **Explicit store:** activities logged on purpose through the store API
//!
//! The feed merges both, explicit entries winning on id collision.
//!
//! ## Example
//!
//! ```rust,no_run
//! use clawdeck_core::{ActivityFeed, Config, JsonStore};
//! use clawdeck_core::types::FeedQuery;
//!
//! let config = Config::load().expect("failed to load config");
//! let store = JsonStore::new(config.store.resolve_path());
//! let feed = ActivityFeed::new(Box::new(store), config.agent.resolve_sessions_dir());
//! let activities = feed.query(&FeedQuery::default()).expect("query failed");
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use feed::ActivityFeed;
pub use gateway::GatewayClient;
pub use store::{ActivityStore, JsonStore, SqliteStore};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod error;
pub mod feed;
pub mod gateway;
pub mod logging;
pub mod store;
pub mod transcript;
pub mod types;
