//! Document store records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored like
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: i64,
    pub song_title: String,
    pub cover_url: Option<String>,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
}

/// A like about to be appended; the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLike {
    pub song_title: String,
    pub cover_url: Option<String>,
    pub user_id: String,
}

/// A stored wall message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub user_id: String,
    pub display_name: String,
    pub timestamp: DateTime<Utc>,
}

/// A message about to be appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub text: String,
    pub user_id: String,
    pub display_name: String,
}
