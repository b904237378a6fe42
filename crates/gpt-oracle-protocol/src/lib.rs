pub mod address;
pub mod agent;
pub mod constants;
pub mod dedup;
pub mod error;
pub mod history;
pub mod instruction;
pub mod logs;

pub use address::derive_interaction_address;
pub use dedup::ReplyDeduplicator;
pub use error::ProtocolError;
pub use history::{InteractionEntry, InteractionQueue};
pub use logs::{parse_reply, Notification, Reply};
