use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tracing::warn;

use super::{ConversationStore, StoreError, StoreSnapshot};
use crate::conversation::{Conversation, Message};

pub struct InMemoryConversationStore {
    conversations: RwLock<HashMap<String, Conversation>>,
    messages: RwLock<HashMap<String, Vec<Message>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            messages: RwLock::new(HashMap::new()),
        }
    }

    /// Build a store from a snapshot. Messages without a `conversation_id`
    /// cannot be placed and are dropped.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let conversations: HashMap<String, Conversation> = snapshot
            .conversations
            .into_iter()
            .map(|c| (c.conversation_id.clone(), c))
            .collect();

        let mut messages: HashMap<String, Vec<Message>> = HashMap::new();
        for message in snapshot.messages {
            let Some(conversation_id) = message.conversation_id.clone() else {
                warn!(
                    target: "twig::store",
                    message_id = message.id(),
                    "Dropping message without conversation id"
                );
                continue;
            };
            messages.entry(conversation_id).or_default().push(message);
        }

        Self {
            conversations: RwLock::new(conversations),
            messages: RwLock::new(messages),
        }
    }

    /// Seed a conversation and its messages, stamping each message with the
    /// conversation's id.
    pub fn with_conversation(mut self, conversation: Conversation, messages: Vec<Message>) -> Self {
        let conversation_id = conversation.conversation_id.clone();
        let messages = messages
            .into_iter()
            .map(|mut m| {
                m.conversation_id = Some(conversation_id.clone());
                m
            })
            .collect();

        self.conversations
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(conversation_id.clone(), conversation);
        self.messages
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(conversation_id, messages);
        self
    }

    /// Everything in the store. Conversations are ordered by id, and messages
    /// are grouped in that same order, each group in stored order.
    pub fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let conversations = self
            .conversations
            .read()
            .map_err(|_| StoreError::lock_poisoned("conversations"))?;
        let messages = self
            .messages
            .read()
            .map_err(|_| StoreError::lock_poisoned("messages"))?;

        let mut conversation_list: Vec<Conversation> = conversations.values().cloned().collect();
        conversation_list.sort_by(|a, b| a.conversation_id.cmp(&b.conversation_id));

        let mut message_groups: Vec<(&String, &Vec<Message>)> = messages.iter().collect();
        message_groups.sort_by(|a, b| a.0.cmp(b.0));
        let message_list = message_groups
            .into_iter()
            .flat_map(|(_, group)| group.iter().cloned())
            .collect();

        Ok(StoreSnapshot {
            conversations: conversation_list,
            messages: message_list,
        })
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn fetch_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<Conversation>, StoreError> {
        let conversations = self
            .conversations
            .read()
            .map_err(|_| StoreError::lock_poisoned("conversations"))?;
        Ok(conversations.get(conversation_id).cloned())
    }

    async fn fetch_messages(&self, conversation_id: &str) -> Result<Vec<Message>, StoreError> {
        let messages = self
            .messages
            .read()
            .map_err(|_| StoreError::lock_poisoned("messages"))?;
        Ok(messages.get(conversation_id).cloned().unwrap_or_default())
    }

    async fn save_conversation(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let mut conversations = self
            .conversations
            .write()
            .map_err(|_| StoreError::lock_poisoned("conversations"))?;
        conversations.insert(conversation.conversation_id.clone(), conversation.clone());
        Ok(())
    }

    async fn save_messages(&self, messages: &[Message]) -> Result<(), StoreError> {
        if let Some(orphan) = messages.iter().find(|m| m.conversation_id.is_none()) {
            return Err(StoreError::invalid_record(format!(
                "message {} has no conversation id",
                orphan.id()
            )));
        }

        let mut stored = self
            .messages
            .write()
            .map_err(|_| StoreError::lock_poisoned("messages"))?;

        for message in messages {
            let Some(conversation_id) = message.conversation_id.as_deref() else {
                continue;
            };
            let group = stored.entry(conversation_id.to_string()).or_default();
            match group.iter_mut().find(|m| m.message_id == message.message_id) {
                Some(existing) => *existing = message.clone(),
                None => group.push(message.clone()),
            }
        }

        Ok(())
    }
}
