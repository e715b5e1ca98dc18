//! Message records as stored by the chat backend.
//!
//! Only the identifier fields are interpreted here:
//! - `message_id` - unique within a conversation's message set
//! - `parent_message_id` - `None` for roots (the `NO_PARENT` sentinel on the wire)
//! - `conversation_id` - propagated, never used for tree building
//!
//! Everything else (text, attachments, model settings, token counts) lives in
//! `payload` and is copied through a fork untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::timestamp::{CREATED_AT, format_timestamp, parse_timestamp};

/// Wire value of `parentMessageId` for messages without a parent.
pub const NO_PARENT: &str = "00000000-0000-0000-0000-000000000000";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message_id: String,
    #[serde(default, with = "parent_id")]
    pub parent_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Everything else, `createdAt` included, kept as stored.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Message {
    pub fn new(message_id: impl Into<String>, parent_message_id: Option<&str>) -> Self {
        Self {
            message_id: message_id.into(),
            parent_message_id: parent_message_id.map(String::from),
            conversation_id: None,
            user: None,
            payload: Map::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.payload
            .insert("text".to_string(), Value::String(text.into()));
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.set_created_at(created_at);
        self
    }

    /// `createdAt`, if present and in a recognized form.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.payload.get(CREATED_AT).and_then(parse_timestamp)
    }

    pub fn set_created_at(&mut self, created_at: DateTime<Utc>) {
        self.payload
            .insert(CREATED_AT.to_string(), format_timestamp(created_at));
    }

    pub fn id(&self) -> &str {
        &self.message_id
    }

    pub fn parent_message_id(&self) -> Option<&str> {
        self.parent_message_id.as_deref()
    }

    /// The `text` payload field, if present and a string.
    pub fn text(&self) -> Option<&str> {
        self.payload.get("text").and_then(Value::as_str)
    }
}

/// Maps the `NO_PARENT` sentinel (and the legacy empty / null / missing forms)
/// to `None`, and writes `None` back out as the sentinel.
mod parent_id {
    use super::NO_PARENT;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value.as_deref().unwrap_or(NO_PARENT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.filter(|id| !id.is_empty() && id != NO_PARENT))
    }
}
