use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{ConversationStore, InMemoryConversationStore, StoreError, StoreSnapshot};
use crate::conversation::{Conversation, Message};

/// A [`StoreSnapshot`] kept in a single JSON file.
///
/// The file is read once on open. Every save rewrites it whole through a
/// temporary sibling file that is renamed into place.
pub struct JsonFileStore {
    path: PathBuf,
    inner: InMemoryConversationStore,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open `path`, starting empty if it does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let snapshot = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str::<StoreSnapshot>(&contents).map_err(|e| {
                StoreError::serialization(format!("{}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreSnapshot::default(),
            Err(e) => return Err(StoreError::io(format!("{}: {e}", path.display()))),
        };

        debug!(
            target: "twig::store::file",
            path = %path.display(),
            conversations = snapshot.conversations.len(),
            messages = snapshot.messages.len(),
            "Opened snapshot file"
        );

        Ok(Self {
            path,
            inner: InMemoryConversationStore::from_snapshot(snapshot),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let snapshot = self.inner.snapshot()?;
        let contents = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| StoreError::serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(format!("{}: {e}", parent.display())))?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| StoreError::io(format!("{}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::io(format!("{}: {e}", self.path.display())))?;

        debug!(
            target: "twig::store::file",
            path = %self.path.display(),
            "Wrote snapshot file"
        );
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for JsonFileStore {
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
        self.inner.save_conversation(conversation).await?;
        self.persist().await
    }

    async fn save_messages(&self, messages: &[Message]) -> Result<(), StoreError> {
        self.inner.save_messages(messages).await?;
        self.persist().await
    }
}
