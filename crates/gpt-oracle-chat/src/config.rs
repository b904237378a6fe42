use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use gpt_oracle_client::{rpc::websocket_url_for, SessionConfig};
use gpt_oracle_protocol::constants::ORACLE_PROGRAM_ID;
use solana_sdk::pubkey::Pubkey;

#[derive(Parser, Debug)]
#[command(name = "gpt-oracle-chat", about = "Chat with an on-chain agent answered by the GPT oracle")]
pub struct Config {
    /// Solana RPC endpoint for blockhashes, submission and account reads.
    #[arg(long, env = "GPT_ORACLE_RPC_URL", default_value = "https://api.devnet.solana.com")]
    pub rpc_url: String,

    /// Websocket endpoint for log subscriptions.
    /// Derived from --rpc-url when absent.
    #[arg(long, env = "GPT_ORACLE_WS_URL")]
    pub ws_url: Option<String>,

    /// Solana CLI JSON keypair paying for and signing requests.
    /// A leading `~/` is expanded to $HOME.
    #[arg(long, env = "GPT_ORACLE_KEYPAIR", default_value = "~/.config/solana/id.json")]
    pub keypair_path: String,

    /// Agent program (base58) whose `interact_agent` instruction is called.
    #[arg(long, env = "GPT_ORACLE_AGENT_PROGRAM")]
    pub agent_program: String,

    /// GPT oracle program (base58) owning the interaction accounts.
    #[arg(long, env = "GPT_ORACLE_PROGRAM", default_value = ORACLE_PROGRAM_ID)]
    pub oracle_program: String,

    /// Milliseconds between signature status polls while confirming.
    #[arg(long, env = "GPT_ORACLE_CONFIRM_POLL_MS", default_value_t = 500)]
    pub confirm_poll_ms: u64,
}

impl Config {
    pub fn ws_url(&self) -> String {
        self.ws_url.clone().unwrap_or_else(|| websocket_url_for(&self.rpc_url))
    }

    pub fn keypair_path(&self) -> PathBuf {
        match (self.keypair_path.strip_prefix("~/"), std::env::var_os("HOME")) {
            (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
            _ => PathBuf::from(&self.keypair_path),
        }
    }

    pub fn confirm_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_ms)
    }

    /// True when the RPC endpoint points at devnet (explorer links need
    /// `?cluster=devnet`).
    pub fn is_devnet(&self) -> bool {
        self.rpc_url.contains("devnet")
    }

    pub fn session_config(&self) -> anyhow::Result<SessionConfig> {
        Ok(SessionConfig {
            agent_program: Pubkey::from_str(self.agent_program.trim())
                .map_err(|e| anyhow::anyhow!("invalid --agent-program: {e}"))?,
            oracle_program: Pubkey::from_str(self.oracle_program.trim())
                .map_err(|e| anyhow::anyhow!("invalid --oracle-program: {e}"))?,
        })
    }
}
