//! Conversation forking.
//!
//! A fork copies part of a conversation's message tree into a brand-new
//! conversation owned by the requesting user:
//!
//! ```text
//! ForkRequest ──► ConversationStore (fetch) ──► MessageTree ──► select()
//!                                                                  │
//!        ForkOutcome ◄── new Conversation ◄── IdentityRemapper ◄───┘
//! ```
//!
//! [`Forker`] does the pure part and returns the outcome; [`ForkService`]
//! additionally writes it back through the store.

mod option;
mod remap;
mod select;
#[cfg(test)]
mod tests;

pub use option::ForkOption;
pub use remap::{IdGenerator, IdentityRemapper, SequentialIds, UuidGenerator};
pub use select::{
    direct_path, include_branches, select, split_at_target_level, target_level,
};

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};

use crate::config::ForkConfig;
use crate::conversation::{Conversation, Message};
use crate::error::{Error, Result};
use crate::store::ConversationStore;
use crate::tree::MessageTree;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkRequest {
    pub original_conversation_id: String,
    pub target_message_id: String,
    pub requesting_user_id: String,
    /// `None` uses the configured default option. Unrecognized strings
    /// deserialize to `None`.
    #[serde(default, deserialize_with = "lenient_option")]
    pub option: Option<ForkOption>,
    /// Reduce the tree with [`split_at_target_level`] at the target first, then
    /// select relative to `latest_message_id`.
    #[serde(default)]
    pub split_at_target: bool,
    #[serde(default)]
    pub latest_message_id: Option<String>,
}

impl ForkRequest {
    pub fn new(
        original_conversation_id: impl Into<String>,
        target_message_id: impl Into<String>,
        requesting_user_id: impl Into<String>,
    ) -> Self {
        Self {
            original_conversation_id: original_conversation_id.into(),
            target_message_id: target_message_id.into(),
            requesting_user_id: requesting_user_id.into(),
            option: None,
            split_at_target: false,
            latest_message_id: None,
        }
    }

    pub fn with_option(mut self, option: ForkOption) -> Self {
        self.option = Some(option);
        self
    }

    pub fn split_at_target(mut self, latest_message_id: impl Into<String>) -> Self {
        self.split_at_target = true;
        self.latest_message_id = Some(latest_message_id.into());
        self
    }

    fn validate(&self) -> Result<()> {
        if self.split_at_target && self.latest_message_id.is_none() {
            return Err(Error::InvalidRequest(
                "latest message id is required when splitting at the target message".to_string(),
            ));
        }
        Ok(())
    }
}

fn lenient_option<'de, D>(deserializer: D) -> std::result::Result<Option<ForkOption>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    match raw.parse::<ForkOption>() {
        Ok(option) => Ok(Some(option)),
        Err(_) => {
            warn!(target: "twig::fork", option = raw, "Unrecognized fork option, using default");
            Ok(None)
        }
    }
}

/// The new conversation and its messages. An empty message list is a valid
/// fork: the target simply was not found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForkOutcome {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

pub struct Forker {
    config: ForkConfig,
    ids: Arc<dyn IdGenerator>,
}

impl Forker {
    pub fn new(config: ForkConfig) -> Self {
        Self {
            config,
            ids: Arc::new(UuidGenerator),
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Fetch the original conversation through `store` and fork it. Nothing is
    /// written.
    pub async fn fork_conversation(
        &self,
        store: &dyn ConversationStore,
        request: &ForkRequest,
    ) -> Result<ForkOutcome> {
        request.validate()?;

        let original = store
            .fetch_conversation(&request.original_conversation_id)
            .await?
            .ok_or_else(|| Error::ConversationNotFound {
                conversation_id: request.original_conversation_id.clone(),
            })?;
        let messages = store
            .fetch_messages(&request.original_conversation_id)
            .await?;

        debug!(
            target: "twig::fork",
            conversation_id = %request.original_conversation_id,
            messages = messages.len(),
            "Fetched conversation for fork"
        );

        self.fork_messages(&original, &messages, request)
    }

    /// Fork an already loaded conversation.
    pub fn fork_messages(
        &self,
        original: &Conversation,
        messages: &[Message],
        request: &ForkRequest,
    ) -> Result<ForkOutcome> {
        request.validate()?;

        let option = request.option.unwrap_or(self.config.default_option);

        let split_messages: Vec<Message>;
        let (source, target_id) = match (&request.latest_message_id, request.split_at_target) {
            (Some(latest), true) => {
                split_messages =
                    split_at_target_level(&MessageTree::new(messages), &request.target_message_id);
                (split_messages.as_slice(), latest.as_str())
            }
            _ => (messages, request.target_message_id.as_str()),
        };

        let tree = MessageTree::new(source);
        let selected = select(&tree, option, target_id);

        let conversation_id = self.ids.next_id();
        let cloned = IdentityRemapper::new(
            self.ids.as_ref(),
            &conversation_id,
            &request.requesting_user_id,
        )
        .monotonic_timestamps(self.config.monotonic_timestamps)
        .remap(selected);

        let conversation = self.derive_conversation(original, conversation_id, request);

        info!(
            target: "twig::fork",
            original = %original.conversation_id,
            fork = %conversation.conversation_id,
            option = %option,
            split = request.split_at_target,
            messages = cloned.len(),
            "Forked conversation"
        );

        Ok(ForkOutcome {
            conversation,
            messages: cloned,
        })
    }

    fn derive_conversation(
        &self,
        original: &Conversation,
        conversation_id: String,
        request: &ForkRequest,
    ) -> Conversation {
        let now = Utc::now();
        let title = original
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| self.config.default_title.clone());

        let mut conversation = Conversation {
            conversation_id,
            title: Some(title),
            user: Some(request.requesting_user_id.clone()),
            endpoint: original.endpoint.clone(),
            payload: original.payload.clone(),
        };
        conversation.stamp(now);
        conversation
    }
}

impl Default for Forker {
    fn default() -> Self {
        Self::new(ForkConfig::default())
    }
}

/// Forks through a store and saves the result back to it.
pub struct ForkService {
    store: Arc<dyn ConversationStore>,
    forker: Forker,
}

impl ForkService {
    pub fn new(store: Arc<dyn ConversationStore>, forker: Forker) -> Self {
        Self { store, forker }
    }

    /// Fork without saving.
    pub async fn preview(&self, request: &ForkRequest) -> Result<ForkOutcome> {
        self.forker
            .fork_conversation(self.store.as_ref(), request)
            .await
    }

    /// Fork and persist the new messages, then the new conversation.
    ///
    /// The conversation record is written last, so a failed message save
    /// leaves no conversation behind. Messages already written by a failed
    /// save are not rolled back; they belong to a conversation id nothing
    /// refers to.
    pub async fn fork(&self, request: &ForkRequest) -> Result<ForkOutcome> {
        let outcome = self.preview(request).await?;

        if !outcome.messages.is_empty() {
            self.store.save_messages(&outcome.messages).await?;
        }
        self.store.save_conversation(&outcome.conversation).await?;

        debug!(
            target: "twig::fork",
            fork = %outcome.conversation.conversation_id,
            "Saved forked conversation"
        );
        Ok(outcome)
    }
}
