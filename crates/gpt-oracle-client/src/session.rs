//! Interaction session: submits requests to the agent program and
//! correlates the oracle's out-of-band replies with them.
//!
//! The session owns every piece of mutable correlation state: the derived
//! interaction address, the single log subscription, the dedup slot and the
//! history. Replies are matched structurally. The history holds at most one
//! unresolved entry, and a notification can only ever resolve that one.
//!
//! ```text
//! Uninitialized -> Initializing -> Ready -> SubmittingTx -> AwaitingReply -> Ready
//!                                    ^            |
//!                                    +-- error ---+
//! ```

use gpt_oracle_protocol::{
    agent::agent_address,
    derive_interaction_address,
    instruction::{build_interact_agent_ix, InteractAccounts},
    parse_reply, InteractionEntry, InteractionQueue, Notification, Reply, ReplyDeduplicator,
};
use serde::Serialize;
use solana_sdk::{
    instruction::Instruction, pubkey::Pubkey, signature::Signature, transaction::Transaction,
};
use tokio::sync::broadcast;

use crate::{
    error::{ClientError, SessionError},
    events::SessionEvent,
    ledger::{Ledger, LogSubscription},
    metadata::ProgramMetadata,
    wallet::Wallet,
};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready,
    SubmittingTx,
    AwaitingReply,
}

/// Program addresses the session talks to.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub agent_program:  Pubkey,
    pub oracle_program: Pubkey,
}

/// What [`InteractionSession::handle_notification`] did with a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// No reply marker, or an empty reply.
    NoReply,
    /// Same signature as the last accepted notification.
    Duplicate,
    /// Nothing was awaiting a reply.
    NoPending,
    Resolved(InteractionEntry),
}

/// Derived once per initialization; fixed while entries are pending.
#[derive(Debug, Clone, Copy)]
struct Channel {
    requester: Pubkey,
    context:   Pubkey,
    address:   Pubkey,
}

pub struct InteractionSession<L, W, M> {
    ledger:   L,
    wallet:   W,
    metadata: M,
    config:   SessionConfig,

    state:        SessionState,
    channel:      Option<Channel>,
    subscription: Option<LogSubscription>,
    dedup:        ReplyDeduplicator,
    history:      InteractionQueue,
    /// Text typed but not yet submitted; cleared on confirmation only.
    input:        String,
    events:       broadcast::Sender<SessionEvent>,
}

impl<L, W, M> InteractionSession<L, W, M>
where
    L: Ledger,
    W: Wallet,
    M: ProgramMetadata,
{
    pub fn new(ledger: L, wallet: W, metadata: M, config: SessionConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            ledger,
            wallet,
            metadata,
            config,
            state: SessionState::Uninitialized,
            channel: None,
            subscription: None,
            dedup: ReplyDeduplicator::new(),
            history: InteractionQueue::new(),
            input: String::new(),
            events,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Newest-first history.
    pub fn history(&self) -> &[InteractionEntry] {
        self.history.entries()
    }

    /// Interaction address replies are published against, once initialized.
    pub fn channel_address(&self) -> Option<Pubkey> {
        self.channel.map(|c| c.address)
    }

    pub fn context(&self) -> Option<Pubkey> {
        self.channel.map(|c| c.context)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn wallet_mut(&mut self) -> &mut W {
        &mut self.wallet
    }

    /// Whether a log subscription is currently open.
    pub fn is_listening(&self) -> bool {
        self.subscription.is_some()
    }

    // ========================================================================
    // Initialization
    // ========================================================================

    /// Fetch the agent context, derive the interaction address and open the
    /// log subscription. May be called again after a failure, or from
    /// `Ready` to re-initialize (which also clears the dedup slot).
    ///
    /// While `AwaitingReply` with a lost subscription, only the subscription
    /// is reopened on the existing channel; the pending entry and the dedup
    /// slot are kept.
    pub async fn initialize(&mut self) -> Result<(), SessionError> {
        let previous = self.state;
        match previous {
            SessionState::Uninitialized | SessionState::Ready => {}
            SessionState::AwaitingReply if self.subscription.is_none() => {
                return self.resubscribe().await;
            }
            _ => return Err(SessionError::NotReady),
        }
        self.set_state(SessionState::Initializing);

        match self.open_channel().await {
            Ok(channel) => {
                tracing::info!(
                    requester = %channel.requester,
                    context   = %channel.context,
                    channel   = %channel.address,
                    "Session ready",
                );
                self.set_state(SessionState::Ready);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Session initialization failed: {e}");
                self.emit(SessionEvent::Error { message: format!("Initialization failed: {e}") });
                self.set_state(previous);
                Err(e)
            }
        }
    }

    async fn open_channel(&mut self) -> Result<Channel, SessionError> {
        let requester = self
            .wallet
            .public_key()
            .ok_or_else(|| SessionError::Initialization("wallet not connected".into()))?;

        let context = self
            .metadata
            .fetch_context()
            .await
            .map_err(|e| SessionError::Initialization(e.to_string()))?;

        let address = derive_interaction_address(&requester, &context, &self.config.oracle_program)?;

        let subscription = self
            .ledger
            .subscribe_logs(address)
            .await
            .map_err(|e| SessionError::Initialization(e.to_string()))?;

        if let Some(mut old) = self.subscription.replace(subscription) {
            old.close();
        }
        self.dedup.reset();

        let channel = Channel { requester, context, address };
        self.channel = Some(channel);
        Ok(channel)
    }

    async fn resubscribe(&mut self) -> Result<(), SessionError> {
        let channel = self.channel.ok_or(SessionError::NotReady)?;
        self.set_state(SessionState::Initializing);

        match self.ledger.subscribe_logs(channel.address).await {
            Ok(subscription) => {
                tracing::info!(channel = %channel.address, "Log subscription reopened");
                self.subscription = Some(subscription);
                self.set_state(SessionState::AwaitingReply);
                Ok(())
            }
            Err(e) => {
                let e = SessionError::Initialization(e.to_string());
                tracing::warn!("Resubscribe failed: {e}");
                self.emit(SessionEvent::Error { message: format!("Initialization failed: {e}") });
                self.set_state(SessionState::AwaitingReply);
                Err(e)
            }
        }
    }

    /// Tear the subscription down. History is kept.
    pub fn shutdown(&mut self) {
        if let Some(mut sub) = self.subscription.take() {
            sub.close();
        }
        self.channel = None;
        self.set_state(SessionState::Uninitialized);
    }

    // ========================================================================
    // Submit path
    // ========================================================================

    /// Submit the current input buffer.
    pub async fn submit_input(&mut self) -> Result<Signature, SessionError> {
        let text = self.input.clone();
        self.submit(&text).await
    }

    /// Build, sign, send and confirm an `interact_agent` request for the
    /// trimmed `text`.
    ///
    /// Only after confirmation is a pending entry pushed and the input buffer
    /// cleared. Any failure leaves the history untouched and the session
    /// `Ready`.
    ///
    /// `&mut self` rules out overlapping calls. `SubmittingTx` can only be
    /// seen again if a started submit future is leaked without being dropped.
    pub async fn submit(&mut self, text: &str) -> Result<Signature, SessionError> {
        match self.state {
            SessionState::Ready => {}
            SessionState::SubmittingTx => return Err(SessionError::AlreadySubmitting),
            _ => return Err(SessionError::NotReady),
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        let payer = self.wallet.public_key().ok_or(SessionError::NotReady)?;
        let channel = self.channel.ok_or(SessionError::NotReady)?;
        if payer != channel.requester {
            // The wallet changed underneath the derived channel.
            return Err(SessionError::NotReady);
        }

        let ix = build_interact_agent_ix(
            &self.config.agent_program,
            &InteractAccounts {
                payer,
                interaction: channel.address,
                agent: agent_address(&self.config.agent_program),
                context: channel.context,
                oracle_program: self.config.oracle_program,
            },
            text,
        );

        tracing::info!(channel = %channel.address, len = text.len(), "Submitting interaction");
        self.set_state(SessionState::SubmittingTx);

        let sent = {
            let mut in_flight = InFlight {
                state:    &mut self.state,
                events:   &self.events,
                finished: false,
            };
            let sent = send_request(&self.ledger, &self.wallet, ix, &payer).await;
            in_flight.finished = true;
            sent
        };

        let signature = match sent {
            Ok(signature) => signature,
            Err(e) => {
                let e = SessionError::from(e);
                tracing::warn!("Interaction transaction failed: {e}");
                self.emit(SessionEvent::Error { message: format!("Transaction failed: {e}") });
                self.set_state(SessionState::Ready);
                return Err(e);
            }
        };

        if let Err(e) = self.history.push_pending(text) {
            self.set_state(SessionState::Ready);
            return Err(e.into());
        }
        self.input.clear();

        tracing::info!(%signature, "Transaction confirmed");
        self.emit(SessionEvent::Confirmed { signature: signature.to_string() });
        self.set_state(SessionState::AwaitingReply);
        Ok(signature)
    }

    // ========================================================================
    // Notification path
    // ========================================================================

    /// Wait for the next log notification. Pends forever while there is no
    /// open subscription, so it can sit in a `select!` unconditionally.
    pub async fn next_notification(&mut self) -> Option<Notification> {
        let Some(sub) = self.subscription.as_mut() else {
            return std::future::pending().await;
        };
        match sub.recv().await {
            Some(notification) => Some(notification),
            None => {
                tracing::warn!(channel = %sub.address(), "Log subscription closed");
                self.subscription = None;
                self.emit(SessionEvent::Error { message: "Log subscription closed".into() });
                None
            }
        }
    }

    /// Apply one notification: parse, deduplicate, resolve the pending entry.
    ///
    /// Dropped notifications are expected noise from a redelivering
    /// transport and are only logged.
    pub fn handle_notification(&mut self, notification: Notification) -> Applied {
        let Some(Reply { reply, amount }) =
            parse_reply(&notification.lines).filter(Reply::is_resolvable)
        else {
            tracing::debug!(signature = %notification.signature, "No reply in notification");
            return Applied::NoReply;
        };

        tracing::debug!(
            previous = ?self.dedup.last_accepted(),
            current  = %notification.signature,
            "Reply notification",
        );
        if !self.dedup.accept(&notification.signature) {
            tracing::debug!(signature = %notification.signature, "Duplicate notification dropped");
            return Applied::Duplicate;
        }

        let signature = notification.signature;
        let Some(entry) = self
            .history
            .resolve_oldest_pending(reply.clone(), amount, signature.clone())
            .cloned()
        else {
            tracing::debug!(%signature, "Reply with nothing pending dropped");
            return Applied::NoPending;
        };

        tracing::info!(%signature, amount = %amount, "Agent replied: {reply}");
        if self.state == SessionState::AwaitingReply {
            self.set_state(SessionState::Ready);
        }
        self.emit(SessionEvent::Replied { signature, reply, amount });
        if amount > 0 {
            self.emit(SessionEvent::Success { amount });
        }
        Applied::Resolved(entry)
    }

    /// Wait for and apply the next notification.
    pub async fn process_next(&mut self) -> Option<Applied> {
        let notification = self.next_notification().await?;
        Some(self.handle_notification(notification))
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn set_state(&mut self, next: SessionState) {
        if self.state == next {
            return;
        }
        tracing::debug!(from = ?self.state, to = ?next, "Session state");
        let from = std::mem::replace(&mut self.state, next);
        self.emit(SessionEvent::StateChanged { from, to: next });
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Resets the state to `Ready` if a submit future is dropped before the
/// ledger round-trip finishes.
struct InFlight<'a> {
    state:    &'a mut SessionState,
    events:   &'a broadcast::Sender<SessionEvent>,
    finished: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        tracing::warn!("Submission dropped before confirmation");
        let from = std::mem::replace(self.state, SessionState::Ready);
        if from != SessionState::Ready {
            let _ = self.events.send(SessionEvent::StateChanged { from, to: SessionState::Ready });
        }
    }
}

async fn send_request<L: Ledger, W: Wallet>(
    ledger: &L,
    wallet: &W,
    ix: Instruction,
    payer: &Pubkey,
) -> Result<Signature, ClientError> {
    let (blockhash, expiry_height) = ledger.latest_blockhash().await?;
    let mut tx = Transaction::new_with_payer(&[ix], Some(payer));
    wallet.sign(&mut tx, blockhash)?;

    let signature = ledger.send_transaction(&tx).await?;
    tracing::debug!(%signature, expiry_height, "Request sent, awaiting confirmation");

    ledger.confirm(&signature, expiry_height).await?;
    Ok(signature)
}
