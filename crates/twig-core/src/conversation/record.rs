use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::timestamp::{CREATED_AT, UPDATED_AT, format_timestamp, parse_timestamp};

/// Conversation metadata. The message tree lives separately and is keyed by
/// `conversation_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub conversation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Owning user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Model endpoint the conversation was held with (e.g. "openAI").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Model settings, `createdAt`/`updatedAt` and any other fields, kept as
    /// stored.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Conversation {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            title: None,
            user: None,
            endpoint: None,
            payload: Map::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.conversation_id
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.payload.get(CREATED_AT).and_then(parse_timestamp)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.payload.get(UPDATED_AT).and_then(parse_timestamp)
    }

    /// Set both `createdAt` and `updatedAt` to `at`.
    pub fn stamp(&mut self, at: DateTime<Utc>) {
        self.payload.insert(CREATED_AT.to_string(), format_timestamp(at));
        self.payload.insert(UPDATED_AT.to_string(), format_timestamp(at));
    }
}
