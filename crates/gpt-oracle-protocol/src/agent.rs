//! Agent program state.
//!
//! Agent account layout (Anchor):
//!   [0..8]   8-byte discriminator
//!   [8..40]  context Pubkey (the oracle context the agent talks in)
//!
//! Trailing bytes are ignored so later fields do not break decoding.

use solana_sdk::pubkey::Pubkey;

use crate::{
    constants::{AGENT_ACCOUNT_NAME, AGENT_SEED},
    error::ProtocolError,
    instruction::anchor_account_discriminator,
};

const CONTEXT_OFFSET: usize = 8;
const MIN_LEN: usize = CONTEXT_OFFSET + 32;

/// Parsed view of the agent program's singleton account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentAccount {
    pub context: Pubkey,
}

impl AgentAccount {
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < MIN_LEN {
            return Err(ProtocolError::AgentAccountTooShort { len: data.len(), need: MIN_LEN });
        }
        if data[..8] != anchor_account_discriminator(AGENT_ACCOUNT_NAME) {
            return Err(ProtocolError::AgentDiscriminatorMismatch);
        }
        let mut context = [0u8; 32];
        context.copy_from_slice(&data[CONTEXT_OFFSET..MIN_LEN]);
        Ok(Self { context: Pubkey::new_from_array(context) })
    }
}

/// Agent PDA: find_program_address(["agent"], agent_program).
pub fn agent_address(agent_program: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[AGENT_SEED], agent_program).0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(context: &Pubkey) -> Vec<u8> {
        let mut data = anchor_account_discriminator("Agent").to_vec();
        data.extend_from_slice(context.as_ref());
        data
    }

    #[test]
    fn decodes_context() {
        let context = Pubkey::new_unique();
        let mut data = encoded(&context);
        data.extend_from_slice(&[0xAA; 16]);
        assert_eq!(AgentAccount::decode(&data).unwrap().context, context);
    }

    #[test]
    fn rejects_short_data() {
        let data = encoded(&Pubkey::new_unique());
        assert_eq!(
            AgentAccount::decode(&data[..20]),
            Err(ProtocolError::AgentAccountTooShort { len: 20, need: 40 })
        );
    }

    #[test]
    fn rejects_wrong_discriminator() {
        let mut data = encoded(&Pubkey::new_unique());
        data[0] ^= 0xFF;
        assert_eq!(AgentAccount::decode(&data), Err(ProtocolError::AgentDiscriminatorMismatch));
    }

    #[test]
    fn agent_address_is_stable() {
        let program = Pubkey::new_unique();
        assert_eq!(agent_address(&program), agent_address(&program));
    }
}
