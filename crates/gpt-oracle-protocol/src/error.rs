use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("an interaction is already awaiting its reply")]
    ConcurrentPending,

    #[error("agent account data too short: {len} bytes, need {need}")]
    AgentAccountTooShort { len: usize, need: usize },

    #[error("agent account discriminator mismatch")]
    AgentDiscriminatorMismatch,
}
