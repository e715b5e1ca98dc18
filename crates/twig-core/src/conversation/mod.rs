mod message;
mod record;
mod timestamp;

pub use message::{Message, NO_PARENT};
pub use record::Conversation;
pub use timestamp::{CREATED_AT, UPDATED_AT, format_timestamp, parse_timestamp};
