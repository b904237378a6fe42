//! Agent program instruction builders.
//!
//! Anchor encoding without an on-chain dependency: 8-byte discriminator
//! followed by Borsh-encoded arguments.

use sha2::{Digest, Sha256};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
#[allow(deprecated)]
use solana_sdk::system_program;

use crate::constants::INTERACT_AGENT_IX;

/// Anchor instruction discriminator: sha256("global:<name>")[..8].
pub fn anchor_discriminator(name: &str) -> [u8; 8] {
    sighash("global", name)
}

/// Anchor account discriminator: sha256("account:<Name>")[..8].
pub fn anchor_account_discriminator(name: &str) -> [u8; 8] {
    sighash("account", name)
}

fn sighash(namespace: &str, name: &str) -> [u8; 8] {
    let hash = Sha256::digest(format!("{namespace}:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash[..8]);
    out
}

/// Accounts referenced by `interact_agent`.
#[derive(Debug, Clone, Copy)]
pub struct InteractAccounts {
    pub payer: Pubkey,
    /// Interaction PDA, also the reply channel.
    pub interaction: Pubkey,
    pub agent: Pubkey,
    pub context: Pubkey,
    pub oracle_program: Pubkey,
}

/// Build the agent program's `interact_agent(text)` instruction.
///
/// Accounts (matching the Anchor `InteractAgent` struct):
///   0. payer          (signer, writable)
///   1. interaction    (writable, created by the oracle CPI)
///   2. agent          (PDA ["agent"], readonly)
///   3. context        (readonly)
///   4. oracle_program (readonly)
///   5. system_program (readonly)
///
/// Instruction data: discriminator(8) + Borsh String (u32 LE len + UTF-8).
pub fn build_interact_agent_ix(
    agent_program: &Pubkey,
    accounts: &InteractAccounts,
    text: &str,
) -> Instruction {
    let mut data = Vec::with_capacity(8 + 4 + text.len());
    data.extend_from_slice(&anchor_discriminator(INTERACT_AGENT_IX));
    data.extend_from_slice(&(text.len() as u32).to_le_bytes());
    data.extend_from_slice(text.as_bytes());

    Instruction {
        program_id: *agent_program,
        accounts: vec![
            AccountMeta::new(accounts.payer, true),
            AccountMeta::new(accounts.interaction, false),
            AccountMeta::new_readonly(accounts.agent, false),
            AccountMeta::new_readonly(accounts.context, false),
            AccountMeta::new_readonly(accounts.oracle_program, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data,
    }
}
