use thiserror::Error;

use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Conversation not found: {conversation_id}")]
    ConversationNotFound { conversation_id: String },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
}
