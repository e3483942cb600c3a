//! Append-only document store
//!
//! Collections accept inserts and time-ordered reads only. Whether a
//! caller may write is decided upstream (the journey session); the store
//! itself only refuses records without an owner.

use super::models::{Like, Message, NewLike, NewMessage};
use crate::time::{Clock, SystemClock};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

/// Likes shown on the message wall
pub const WALL_LIKES_LIMIT: u32 = 20;

/// Messages shown on the message wall
pub const WALL_MESSAGES_LIMIT: u32 = 10;

/// Append-only store for likes and messages
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn add_like(&self, like: NewLike) -> Result<Like>;

    async fn add_message(&self, message: NewMessage) -> Result<Message>;

    /// Newest first
    async fn recent_likes(&self, limit: u32) -> Result<Vec<Like>>;

    /// Newest first
    async fn recent_messages(&self, limit: u32) -> Result<Vec<Message>>;
}

/// SQLite-backed document store
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    /// Timestamps come from `clock` instead of the wall clock
    pub fn with_clock(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn require_owner(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(Error::InvalidInput("record has no owner".to_string()));
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn add_like(&self, like: NewLike) -> Result<Like> {
        require_owner(&like.user_id)?;
        let timestamp = self.clock.now();

        let result = sqlx::query(
            "INSERT INTO likes (song_title, cover_url, user_id, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(&like.song_title)
        .bind(&like.cover_url)
        .bind(&like.user_id)
        .bind(timestamp)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, song_title = %like.song_title, "Like stored");

        Ok(Like {
            id,
            song_title: like.song_title,
            cover_url: like.cover_url,
            user_id: like.user_id,
            timestamp,
        })
    }

    async fn add_message(&self, message: NewMessage) -> Result<Message> {
        require_owner(&message.user_id)?;
        let timestamp = self.clock.now();

        let result = sqlx::query(
            "INSERT INTO messages (text, user_id, display_name, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(&message.text)
        .bind(&message.user_id)
        .bind(&message.display_name)
        .bind(timestamp)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, display_name = %message.display_name, "Message stored");

        Ok(Message {
            id,
            text: message.text,
            user_id: message.user_id,
            display_name: message.display_name,
            timestamp,
        })
    }

    async fn recent_likes(&self, limit: u32) -> Result<Vec<Like>> {
        let rows = sqlx::query_as::<_, (i64, String, Option<String>, String, DateTime<Utc>)>(
            "SELECT id, song_title, cover_url, user_id, timestamp FROM likes \
             ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, song_title, cover_url, user_id, timestamp)| Like {
                id,
                song_title,
                cover_url,
                user_id,
                timestamp,
            })
            .collect())
    }

    async fn recent_messages(&self, limit: u32) -> Result<Vec<Message>> {
        let rows = sqlx::query_as::<_, (i64, String, String, String, DateTime<Utc>)>(
            "SELECT id, text, user_id, display_name, timestamp FROM messages \
             ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, text, user_id, display_name, timestamp)| Message {
                id,
                text,
                user_id,
                display_name,
                timestamp,
            })
            .collect())
    }
}
