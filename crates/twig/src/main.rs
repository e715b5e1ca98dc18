use clap::Parser;
use eyre::Result;

use twig::cli::config::load_config;
use twig::cli::{Cli, Commands};
use twig::commands::{Command, fork::ForkCommand, tree::TreeCommand};

#[tokio::main]
async fn main() -> Result<()> {
    // Install color-eyre for better error reports
    color_eyre::install()?;

    let cli = Cli::parse();

    // Initialize tracing (level configured via RUST_LOG env var)
    twig_core::utils::tracing::init_tracing()?;

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Tree {
            store,
            conversation,
        } => {
            TreeCommand {
                store,
                conversation,
            }
            .execute()
            .await
        }
        Commands::Fork {
            store,
            conversation,
            target,
            user,
            option,
            split_at_target,
            latest,
            dry_run,
            json,
        } => {
            ForkCommand {
                store,
                conversation,
                target,
                user,
                option,
                latest,
                split_at_target,
                dry_run,
                json,
                config,
            }
            .execute()
            .await
        }
    }
}
