//! Test utilities for twig-core
//!
//! Fixture trees and store doubles shared by unit tests, integration tests and
//! the CLI crate.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::conversation::{Conversation, Message};
use crate::store::{ConversationStore, InMemoryConversationStore, StoreError};

fn day(n: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2021, 1, n)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .unwrap_or_default()
}

fn numbered(id: &str, parent: Option<&str>) -> Message {
    Message::new(id, parent).with_text(format!("Message {id}"))
}

/// Two roots, "0" and "1"; everything else hangs off "1":
///
/// ```text
/// 0
/// 1 ─┬─ 2 ─┬─ 4
///    │     └─ 5
///    └─ 3 ─┬─ 6
///          └─ 7 ── 8
/// ```
pub fn branching_fixture() -> Vec<Message> {
    let rows: [(&str, Option<&str>, &str, u32); 9] = [
        ("0", None, "Root message 1", 1),
        ("1", None, "Root message 2", 1),
        ("2", Some("1"), "Child of 1", 2),
        ("3", Some("1"), "Child of 1", 3),
        ("4", Some("2"), "Child of 2", 4),
        ("5", Some("2"), "Child of 2", 5),
        ("6", Some("3"), "Child of 3", 6),
        ("7", Some("3"), "Child of 3", 7),
        ("8", Some("7"), "Child of 7", 7),
    ];

    rows.into_iter()
        .map(|(id, parent, text, d)| {
            Message::new(id, parent)
                .with_text(text)
                .with_created_at(day(d))
        })
        .collect()
}

/// Roots "11" and "12", with "13" carrying three children. Listed out of id
/// order ("21" comes before "17").
pub fn nested_fixture() -> Vec<Message> {
    vec![
        numbered("11", None),
        numbered("12", None),
        numbered("13", Some("11")),
        numbered("14", Some("12")),
        numbered("15", Some("13")),
        numbered("16", Some("13")),
        numbered("21", Some("13")),
        numbered("17", Some("14")),
        numbered("18", Some("16")),
        numbered("19", Some("18")),
        numbered("20", Some("19")),
    ]
}

/// Four levels across two roots:
///
/// ```text
/// level 0: 7 8
/// level 1: 5 6 9
/// level 2: 2 3 1 4
/// level 3: 10
/// ```
pub fn level_fixture() -> Vec<Message> {
    vec![
        numbered("7", None),
        numbered("8", None),
        numbered("5", Some("7")),
        numbered("6", Some("7")),
        numbered("9", Some("8")),
        numbered("2", Some("5")),
        numbered("3", Some("5")),
        numbered("1", Some("6")),
        numbered("4", Some("6")),
        numbered("10", Some("3")),
    ]
}

pub fn ids(messages: &[&Message]) -> Vec<String> {
    messages.iter().map(|m| m.id().to_string()).collect()
}

/// Finds the conversation but fails every message fetch and every save.
pub struct FailingStore {
    conversation: Conversation,
}

impl FailingStore {
    pub fn new(conversation: Conversation) -> Self {
        Self { conversation }
    }
}

#[async_trait]
impl ConversationStore for FailingStore {
    async fn fetch_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<Conversation>, StoreError> {
        Ok((self.conversation.conversation_id == conversation_id)
            .then(|| self.conversation.clone()))
    }

    async fn fetch_messages(&self, _conversation_id: &str) -> Result<Vec<Message>, StoreError> {
        Err(StoreError::database("Failed to fetch messages"))
    }

    async fn save_conversation(&self, _conversation: &Conversation) -> Result<(), StoreError> {
        Err(StoreError::database("Failed to save conversation"))
    }

    async fn save_messages(&self, _messages: &[Message]) -> Result<(), StoreError> {
        Err(StoreError::database("Failed to save messages"))
    }
}

/// An in-memory store whose message saves always fail.
pub struct RejectingMessagesStore {
    inner: InMemoryConversationStore,
}

impl RejectingMessagesStore {
    pub fn new(inner: InMemoryConversationStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ConversationStore for RejectingMessagesStore {
    async fn fetch_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<Conversation>, StoreError> {
        self.inner.fetch_conversation(conversation_id).await
    }

    async fn fetch_messages(&self, conversation_id: &str) -> Result<Vec<Message>, StoreError> {
        self.inner.fetch_messages(conversation_id).await
    }

    async fn save_conversation(&self, conversation: &Conversation) -> Result<(), StoreError> {
        self.inner.save_conversation(conversation).await
    }

    async fn save_messages(&self, _messages: &[Message]) -> Result<(), StoreError> {
        Err(StoreError::database("Failed to save messages"))
    }
}
