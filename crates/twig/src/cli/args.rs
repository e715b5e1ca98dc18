use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fork chat conversations at any message in their tree.
#[derive(Parser)]
#[command(version, about, long_about = None, author)]
pub struct Cli {
    /// Path to a config file (TOML format, defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Print a conversation's message tree
    Tree {
        /// Snapshot file holding conversations and messages
        #[arg(long, env = "TWIG_STORE")]
        store: PathBuf,
        /// Conversation to print
        #[arg(long)]
        conversation: String,
    },
    /// Fork a conversation into a new one
    Fork {
        /// Snapshot file holding conversations and messages
        #[arg(long, env = "TWIG_STORE")]
        store: PathBuf,
        /// Conversation to fork
        #[arg(long)]
        conversation: String,
        /// Message to fork at
        #[arg(long)]
        target: String,
        /// User who will own the fork
        #[arg(long)]
        user: String,
        /// What to carry over: DIRECT_PATH, INCLUDE_BRANCHES or TARGET_LEVEL
        /// (defaults to the configured option)
        #[arg(long)]
        option: Option<String>,
        /// Drop everything above the target's level before selecting
        #[arg(long, requires = "latest")]
        split_at_target: bool,
        /// Message to select from after splitting
        #[arg(long)]
        latest: Option<String>,
        /// Print the fork without saving it
        #[arg(long)]
        dry_run: bool,
        /// Print the fork as JSON instead of a tree
        #[arg(long)]
        json: bool,
    },
}
