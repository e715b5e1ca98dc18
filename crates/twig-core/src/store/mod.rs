//! Data-access contract the forker reads from and writes to.
//!
//! The chat backend owns real persistence; the implementations here exist for
//! tests and for working against exported snapshots.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::InMemoryConversationStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conversation::{Conversation, Message};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Invalid record: {message}")]
    InvalidRecord { message: String },

    #[error("In-memory store lock poisoned: {message}")]
    LockPoisoned { message: String },
}

impl StoreError {
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    pub fn lock_poisoned(message: impl Into<String>) -> Self {
        Self::LockPoisoned {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// `Ok(None)` when no conversation has this id.
    async fn fetch_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<Conversation>, StoreError>;

    /// All messages of a conversation in stored order. Unknown conversations
    /// have no messages.
    async fn fetch_messages(&self, conversation_id: &str) -> Result<Vec<Message>, StoreError>;

    /// Insert or replace by `conversation_id`.
    async fn save_conversation(&self, conversation: &Conversation) -> Result<(), StoreError>;

    /// Insert or replace by `message_id`, grouped by each message's
    /// `conversation_id`.
    async fn save_messages(&self, messages: &[Message]) -> Result<(), StoreError>;
}

/// Whole-store contents, also the on-disk format of [`JsonFileStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    #[serde(default)]
    pub conversations: Vec<Conversation>,
    #[serde(default)]
    pub messages: Vec<Message>,
}
