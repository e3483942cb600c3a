//! # ECHO Common Library
//!
//! Shared code for the ECHO proxy and journey client:
//! - Song, payload and document-store models
//! - Search query building
//! - Injectable clock
//! - Journey event types and the event bus
//! - Configuration loading
//! - Append-only document store (likes and messages)

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod query;
pub mod time;

pub use error::{Error, Result};
pub use models::{Payload, Region, Song, Stage};
pub use query::build_search_query;
pub use time::{Clock, ManualClock, SystemClock};
