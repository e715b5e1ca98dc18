use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Duration;
use uuid::Uuid;

use crate::conversation::Message;

/// Source of fresh message and conversation ids.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs, the id format the chat backend uses.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Counts up from "1". Deterministic ids for tests and dry runs.
#[derive(Debug, Default)]
pub struct SequentialIds {
    counter: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        (self.counter.fetch_add(1, Ordering::Relaxed) + 1).to_string()
    }
}

/// Copies selected messages under fresh ids, rewriting parent links.
pub struct IdentityRemapper<'r> {
    ids: &'r dyn IdGenerator,
    conversation_id: &'r str,
    user: &'r str,
    monotonic_timestamps: bool,
}

impl<'r> IdentityRemapper<'r> {
    pub fn new(ids: &'r dyn IdGenerator, conversation_id: &'r str, user: &'r str) -> Self {
        Self {
            ids,
            conversation_id,
            user,
            monotonic_timestamps: false,
        }
    }

    /// Push a copy's `createdAt` to at least 1ms after its new parent's.
    /// Timestamps that do not parse are left as stored.
    pub fn monotonic_timestamps(mut self, enabled: bool) -> Self {
        self.monotonic_timestamps = enabled;
        self
    }

    /// Clone `selected` in order.
    ///
    /// A copy keeps its parent link only if the parent came earlier in
    /// `selected`; otherwise it becomes a root. Selection must therefore list
    /// parents before children.
    pub fn remap<'a>(&self, selected: impl IntoIterator<Item = &'a Message>) -> Vec<Message> {
        let mut cloned: Vec<Message> = Vec::new();
        let mut index_by_old_id: HashMap<&'a str, usize> = HashMap::new();

        for original in selected {
            let parent = original
                .parent_message_id()
                .and_then(|old_parent| index_by_old_id.get(old_parent))
                .and_then(|&index| cloned.get(index));

            let mut copy = original.clone();
            copy.message_id = self.ids.next_id();
            copy.parent_message_id = parent.map(|p| p.message_id.clone());
            copy.conversation_id = Some(self.conversation_id.to_string());
            copy.user = Some(self.user.to_string());

            if self.monotonic_timestamps {
                if let (Some(created_at), Some(parent_at)) =
                    (copy.created_at(), parent.and_then(Message::created_at))
                {
                    if created_at <= parent_at {
                        copy.set_created_at(parent_at + Duration::milliseconds(1));
                    }
                }
            }

            index_by_old_id.insert(original.id(), cloned.len());
            cloned.push(copy);
        }

        cloned
    }
}
