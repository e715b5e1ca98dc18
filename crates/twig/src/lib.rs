pub mod cli;
pub mod commands;

pub use twig_core::{config, conversation, fork, store, tree, utils};
