//! Visitor identity, likes and the message wall
//!
//! Every session gets an anonymous uid. Only a named identity may write;
//! a guest's like is dropped quietly, a guest's message is refused.

use echo_common::config::{resolve_root_folder, TomlConfig};
use echo_common::db::{
    init_database, DocumentStore, Like, Message, NewLike, NewMessage, SqliteDocumentStore,
    DATABASE_FILE, WALL_LIKES_LIMIT, WALL_MESSAGES_LIMIT,
};
use echo_common::models::Song;
use echo_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Environment override for the folder holding the wall store
pub const ENV_ROOT_FOLDER: &str = "ECHO_ROOT";

/// Location of the wall store: CLI → `ECHO_ROOT` → TOML → OS default
pub fn store_path(cli_root: Option<&str>, toml: &TomlConfig) -> PathBuf {
    resolve_root_folder(cli_root, ENV_ROOT_FOLDER, toml).join(DATABASE_FILE)
}

/// Open (or create) the wall store at `path`
pub async fn open_store(path: &Path) -> Result<Arc<SqliteDocumentStore>> {
    let pool = init_database(path).await?;
    Ok(Arc::new(SqliteDocumentStore::new(pool)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Identity {
    Guest,
    Named { uid: String, display_name: String },
}

impl Identity {
    pub fn is_guest(&self) -> bool {
        matches!(self, Identity::Guest)
    }

    pub fn display_name(&self) -> &str {
        match self {
            Identity::Guest => "Guest",
            Identity::Named { display_name, .. } => display_name,
        }
    }
}

/// What the message wall shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wall {
    /// Newest first
    pub likes: Vec<Like>,
    /// Newest first
    pub messages: Vec<Message>,
}

pub struct Session {
    uid: String,
    identity: Identity,
    draft: String,
    store: Arc<dyn DocumentStore>,
}

impl Session {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            uid: Uuid::new_v4().to_string(),
            identity: Identity::Guest,
            draft: String::new(),
            store,
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Blank names are refused and leave the identity untouched
    pub fn login(&mut self, name: &str) -> Result<&Identity> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("Please enter a name".to_string()));
        }
        self.identity = Identity::Named {
            uid: self.uid.clone(),
            display_name: name.to_string(),
        };
        info!(display_name = %name, "Logged in");
        Ok(&self.identity)
    }

    pub fn continue_as_guest(&mut self) -> &Identity {
        self.identity = Identity::Guest;
        &self.identity
    }

    /// Guests get `Ok(None)` and nothing is written
    pub async fn like(&self, song: &Song) -> Result<Option<Like>> {
        let Identity::Named { uid, .. } = &self.identity else {
            debug!(title = %song.title, "Guest like ignored");
            return Ok(None);
        };

        let like = self
            .store
            .add_like(NewLike {
                song_title: song.title.clone(),
                cover_url: song.cover_url.clone(),
                user_id: uid.clone(),
            })
            .await?;
        Ok(Some(like))
    }

    pub async fn send_message(&self, text: &str) -> Result<Message> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("Message cannot be empty".to_string()));
        }
        let Identity::Named { uid, display_name } = &self.identity else {
            return Err(Error::LoginRequired(
                "Please login to send messages.".to_string(),
            ));
        };

        self.store
            .add_message(NewMessage {
                text: text.to_string(),
                user_id: uid.clone(),
                display_name: display_name.clone(),
            })
            .await
    }

    /// Send the draft; it is cleared only when the write succeeds
    pub async fn send_draft(&mut self) -> Result<Message> {
        let message = self.send_message(&self.draft).await?;
        self.draft.clear();
        Ok(message)
    }

    pub async fn wall(&self) -> Result<Wall> {
        Ok(Wall {
            likes: self.store.recent_likes(WALL_LIKES_LIMIT).await?,
            messages: self.store.recent_messages(WALL_MESSAGES_LIMIT).await?,
        })
    }
}
