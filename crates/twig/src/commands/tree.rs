use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use eyre::{Result, eyre};
use twig_core::store::{ConversationStore, JsonFileStore};
use twig_core::tree::{MessageTree, render_tree};

use super::Command;

pub struct TreeCommand {
    pub store: PathBuf,
    pub conversation: String,
}

impl TreeCommand {
    pub async fn run(&self, out: &mut (dyn Write + Send)) -> Result<()> {
        let store = JsonFileStore::open(&self.store)
            .await
            .map_err(|e| eyre!("Failed to open store {}: {}", self.store.display(), e))?;

        let conversation = store
            .fetch_conversation(&self.conversation)
            .await?
            .ok_or_else(|| eyre!("Conversation not found: {}", self.conversation))?;
        let messages = store.fetch_messages(&self.conversation).await?;
        let tree = MessageTree::new(&messages);

        writeln!(
            out,
            "{} ({} messages)",
            conversation.title.as_deref().unwrap_or(&conversation.conversation_id),
            tree.len()
        )?;
        if tree.is_empty() {
            writeln!(out, "(no messages)")?;
        } else {
            write!(out, "{}", render_tree(&tree))?;
        }
        Ok(())
    }
}

#[async_trait]
impl Command for TreeCommand {
    async fn execute(&self) -> Result<()> {
        let mut stdout = std::io::stdout();
        self.run(&mut stdout).await
    }
}
