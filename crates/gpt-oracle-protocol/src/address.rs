//! Interaction channel address derivation.
//!
//! The oracle publishes its callback against the interaction PDA
//! `["interaction", requester, context]` owned by the oracle program, so
//! this address is both the request's writable account and the log
//! subscription target.

use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;

use crate::{constants::INTERACTION_SEED, error::ProtocolError};

/// Derive the interaction (reply channel) address for `requester` in `context`.
///
/// Pure and deterministic: equal inputs always produce the same address.
pub fn derive_interaction_address(
    requester: &Pubkey,
    context: &Pubkey,
    oracle_program: &Pubkey,
) -> Result<Pubkey, ProtocolError> {
    Pubkey::try_find_program_address(
        &[INTERACTION_SEED, requester.as_ref(), context.as_ref()],
        oracle_program,
    )
    .map(|(address, _bump)| address)
    .ok_or_else(|| {
        ProtocolError::InvalidIdentity(format!(
            "no off-curve interaction address for requester {requester} in context {context}"
        ))
    })
}

/// Same as [`derive_interaction_address`] but from base58 strings.
pub fn derive_interaction_address_str(
    requester: &str,
    context: &str,
    oracle_program: &str,
) -> Result<Pubkey, ProtocolError> {
    let requester = parse_pubkey("requester", requester)?;
    let context = parse_pubkey("context", context)?;
    let oracle_program = parse_pubkey("oracle program", oracle_program)?;
    derive_interaction_address(&requester, &context, &oracle_program)
}

/// Parse a base58 pubkey, labelling the failure with `what`.
pub fn parse_pubkey(what: &str, s: &str) -> Result<Pubkey, ProtocolError> {
    Pubkey::from_str(s.trim())
        .map_err(|e| ProtocolError::InvalidIdentity(format!("{what} '{s}': {e}")))
}
