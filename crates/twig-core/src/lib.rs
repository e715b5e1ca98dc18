// Conversation tree forking without UI or transport dependencies

pub mod config;
pub mod conversation;
pub mod error;
pub mod fork;
pub mod store;
pub mod test_utils;
pub mod tree;
pub mod utils;

pub use config::ForkConfig;
pub use conversation::{Conversation, Message, NO_PARENT};
pub use error::{Error, Result};
pub use fork::{ForkOption, ForkOutcome, ForkRequest, ForkService, Forker};
pub use store::{ConversationStore, InMemoryConversationStore, JsonFileStore, StoreError};
pub use tree::MessageTree;
