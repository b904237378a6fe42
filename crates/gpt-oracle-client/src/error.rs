use gpt_oracle_protocol::ProtocolError;
use thiserror::Error;

/// Failures reported by the external collaborators.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("wallet not connected")]
    NotConnected,

    #[error("keypair error: {0}")]
    Keypair(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("send failed: {0}")]
    Send(String),

    #[error("confirmation failed: {0}")]
    Confirmation(String),

    #[error("transaction {signature} expired: block height passed {expiry_height}")]
    Expired { signature: String, expiry_height: u64 },

    #[error("metadata error: {0}")]
    Metadata(String),

    #[error("subscription error: {0}")]
    Subscription(String),

    #[error("RPC error: {0}")]
    Rpc(String),
}

/// Errors surfaced by [`crate::InteractionSession`]. None of them are fatal;
/// the session is always left in a state that accepts the next call.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("initialization failed: {0}")]
    Initialization(String),

    #[error("session is not ready")]
    NotReady,

    #[error("a submission is already in flight")]
    AlreadySubmitting,

    #[error("an interaction is already awaiting its reply")]
    ConcurrentPending,

    #[error("input is empty")]
    EmptyInput,

    #[error("send failed: {0}")]
    Send(String),

    #[error("confirmation failed: {0}")]
    Confirmation(String),
}

impl From<ProtocolError> for SessionError {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::InvalidIdentity(msg) => SessionError::InvalidIdentity(msg),
            ProtocolError::ConcurrentPending => SessionError::ConcurrentPending,
            other => SessionError::Initialization(other.to_string()),
        }
    }
}

impl From<ClientError> for SessionError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::NotConnected => SessionError::NotReady,
            ClientError::Confirmation(msg) => SessionError::Confirmation(msg),
            e @ ClientError::Expired { .. } => SessionError::Confirmation(e.to_string()),
            other => SessionError::Send(other.to_string()),
        }
    }
}
