//! Core data models for the analytics engine.

mod ids;
mod loadable;
mod match_result;
mod player_stat;
mod stats_blob;
mod team;

pub use ids::*;
pub use loadable::*;
pub use match_result::*;
pub use player_stat::*;
pub use stats_blob::*;
pub use team::*;
