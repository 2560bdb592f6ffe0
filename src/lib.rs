//! # Match Analytics
//!
//! Team match analytics and head-to-head comparison engine.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (results, stats blobs, stat lines)
//! - **source**: Statistics service contract and the scripted mock
//! - **fetch**: HTTP client for the statistics service
//! - **cache**: Content-addressed cache of per-game stats
//! - **calculate**: Aggregation, activity, filter/sort and map comparison
//! - **selection**: Hover/sticky selection with the stale-fetch guard
//! - **session**: Per-comparison orchestration of all of the above
//! - **directory**: Team display metadata
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod cache;
pub mod calculate;
pub mod config;
pub mod directory;
pub mod fetch;
pub mod models;
pub mod selection;
pub mod session;
pub mod source;

pub use models::*;
