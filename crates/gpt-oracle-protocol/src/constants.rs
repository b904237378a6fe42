// ============================================================================
// Oracle protocol constants
// ============================================================================

// --- Program IDs ------------------------------------------------------------

/// GPT oracle program (same address on devnet and mainnet).
pub const ORACLE_PROGRAM_ID: &str = "LLMrieZMpbJFwN52WgmBNMxYojrpRVYXdC1RCweEbab";

// --- PDA seeds --------------------------------------------------------------

/// Seed prefix of the per-(user, context) interaction account owned by the oracle.
pub const INTERACTION_SEED: &[u8] = b"interaction";

/// Seed of the agent program's singleton `Agent` account.
pub const AGENT_SEED: &[u8] = b"agent";

// --- Log markers ------------------------------------------------------------
// Emitted by the agent program's callback when the oracle answers.

/// Marker preceding the reply text.
pub const REPLY_TAG: &str = "Agent Reply:";

/// Marker preceding the reward amount.
pub const AMOUNT_TAG: &str = "Amount:";

/// Prefix the runtime prepends to every `msg!` line.
pub const PROGRAM_LOG_PREFIX: &str = "Program log: ";

// --- Instructions -----------------------------------------------------------

/// Anchor method name of the agent program's request instruction.
pub const INTERACT_AGENT_IX: &str = "interact_agent";

/// Anchor account name of the agent program's singleton state.
pub const AGENT_ACCOUNT_NAME: &str = "Agent";
