use std::sync::Arc;

use async_trait::async_trait;
use gpt_oracle_protocol::agent::{agent_address, AgentAccount};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;

use crate::error::ClientError;

/// Source of the conversation context the requests are addressed to.
#[async_trait]
pub trait ProgramMetadata: Send + Sync {
    async fn fetch_context(&self) -> Result<Pubkey, ClientError>;
}

/// Reads the context from the agent program's `["agent"]` account.
pub struct AgentMetadata {
    rpc: Arc<RpcClient>,
    agent_program: Pubkey,
}

impl AgentMetadata {
    pub fn new(rpc: Arc<RpcClient>, agent_program: Pubkey) -> Self {
        Self { rpc, agent_program }
    }
}

#[async_trait]
impl ProgramMetadata for AgentMetadata {
    async fn fetch_context(&self) -> Result<Pubkey, ClientError> {
        let pda = agent_address(&self.agent_program);

        // get_multiple_accounts reports a missing account as None rather than
        // as an error string.
        let mut accounts = self
            .rpc
            .get_multiple_accounts(&[pda])
            .await
            .map_err(|e| ClientError::Metadata(format!("RPC error reading agent PDA: {e}")))?;

        let account = accounts
            .pop()
            .flatten()
            .ok_or_else(|| ClientError::Metadata(format!("agent account {pda} not found")))?;

        let agent = AgentAccount::decode(&account.data)
            .map_err(|e| ClientError::Metadata(format!("agent account {pda}: {e}")))?;

        tracing::debug!(agent = %pda, context = %agent.context, "Fetched agent context");
        Ok(agent.context)
    }
}
