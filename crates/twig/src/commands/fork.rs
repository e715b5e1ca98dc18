use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use eyre::{Result, eyre};
use tracing::info;
use twig_core::config::ForkConfig;
use twig_core::fork::{ForkOption, ForkOutcome, ForkRequest, ForkService, Forker};
use twig_core::store::JsonFileStore;
use twig_core::tree::{MessageTree, render_tree};

use super::Command;

pub struct ForkCommand {
    pub store: PathBuf,
    pub conversation: String,
    pub target: String,
    pub user: String,
    pub option: Option<String>,
    pub latest: Option<String>,
    pub split_at_target: bool,
    pub dry_run: bool,
    pub json: bool,
    pub config: ForkConfig,
}

impl ForkCommand {
    fn request(&self) -> ForkRequest {
        let option = ForkOption::parse_or(self.option.as_deref(), self.config.default_option);
        let mut request = ForkRequest::new(&self.conversation, &self.target, &self.user)
            .with_option(option);
        request.split_at_target = self.split_at_target;
        request.latest_message_id.clone_from(&self.latest);
        request
    }

    pub async fn run(&self, out: &mut (dyn Write + Send)) -> Result<()> {
        let store = JsonFileStore::open(&self.store)
            .await
            .map_err(|e| eyre!("Failed to open store {}: {}", self.store.display(), e))?;
        let service = ForkService::new(Arc::new(store), Forker::new(self.config.clone()));

        let request = self.request();
        let outcome = if self.dry_run {
            service.preview(&request).await?
        } else {
            service.fork(&request).await?
        };

        info!(
            target: "twig::commands::fork",
            fork = %outcome.conversation.conversation_id,
            dry_run = self.dry_run,
            "Fork command finished"
        );

        if self.json {
            writeln!(out, "{}", serde_json::to_string_pretty(&outcome)?)?;
        } else {
            self.print_summary(&outcome, out)?;
        }
        Ok(())
    }

    fn print_summary(&self, outcome: &ForkOutcome, out: &mut (dyn Write + Send)) -> Result<()> {
        let verb = if self.dry_run { "Would create" } else { "Created" };
        writeln!(
            out,
            "{verb} conversation {} with {} messages",
            outcome.conversation.conversation_id,
            outcome.messages.len()
        )?;
        if outcome.messages.is_empty() {
            writeln!(out, "Target message {} not found", self.target)?;
            return Ok(());
        }
        write!(out, "{}", render_tree(&MessageTree::new(&outcome.messages)))?;
        Ok(())
    }
}

#[async_trait]
impl Command for ForkCommand {
    async fn execute(&self) -> Result<()> {
        let mut stdout = std::io::stdout();
        self.run(&mut stdout).await
    }
}
