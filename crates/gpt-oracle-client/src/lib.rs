// gpt-oracle-client: Solana collaborators (ledger, wallet, agent metadata)
// and the interaction session that correlates oracle replies with requests.

pub mod error;
pub mod events;
pub mod ledger;
pub mod metadata;
pub mod rpc;
pub mod session;
pub mod wallet;

pub use error::{ClientError, SessionError};
pub use events::SessionEvent;
pub use ledger::{Ledger, LogSubscription};
pub use metadata::{AgentMetadata, ProgramMetadata};
pub use rpc::RpcLedger;
pub use session::{Applied, InteractionSession, SessionConfig, SessionState};
pub use wallet::{KeypairWallet, Wallet};
